#![allow(dead_code)]

use rand::{rngs::StdRng, Rng, SeedableRng};
use wy_core::{c64, ComplexField, Mat, MatRef};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0)
}

pub fn random_f64(rng: &mut StdRng, nrows: usize, ncols: usize) -> Mat<f64> {
    Mat::from_fn(nrows, ncols, |_, _| rng.gen::<f64>() - 0.5)
}

pub fn random_c64(rng: &mut StdRng, nrows: usize, ncols: usize) -> Mat<c64> {
    Mat::from_fn(nrows, ncols, |_, _| {
        c64::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5)
    })
}

pub fn conj_transpose<T: ComplexField>(a: MatRef<'_, T>) -> Mat<T> {
    Mat::from_fn(a.ncols(), a.nrows(), |i, j| a.read(j, i).conj())
}

pub fn max_abs_diff<T: ComplexField<Real = f64>>(a: MatRef<'_, T>, b: MatRef<'_, T>) -> f64 {
    assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()));
    let mut max = 0.0f64;
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            max = max.max((a.read(i, j) - b.read(i, j)).abs());
        }
    }
    max
}

/// Largest deviation of `Q^H Q` from the identity.
pub fn orthogonality_error<T: ComplexField<Real = f64>>(q: MatRef<'_, T>) -> f64 {
    let qh = conj_transpose(q);
    let product = qh.as_ref() * q;
    let id = Mat::<T>::identity(q.ncols(), q.ncols());
    max_abs_diff(product.as_ref(), id.as_ref())
}
