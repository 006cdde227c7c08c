use assert2::assert as fancy_assert;
use core::cell::RefCell;
use rand::{rngs::StdRng, Rng, SeedableRng};
use wy_core::{c64, Access, ComplexField, Direction, Mat, MatRef, Op, Storage};

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::seed_from_u64(0));
}

pub trait TestScalar: ComplexField<Real = f64> {
    fn random(rng: &mut StdRng) -> Self;
    fn nan() -> Self;
}

impl TestScalar for f64 {
    fn random(rng: &mut StdRng) -> Self {
        rng.gen::<f64>() - 0.5
    }

    fn nan() -> Self {
        f64::NAN
    }
}

impl TestScalar for c64 {
    fn random(rng: &mut StdRng) -> Self {
        c64::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5)
    }

    fn nan() -> Self {
        c64::new(f64::NAN, f64::NAN)
    }
}

pub fn nan<T: TestScalar>() -> T {
    T::nan()
}

pub fn random_value<T: TestScalar>() -> T {
    RNG.with(|rng| T::random(&mut rng.borrow_mut()))
}

pub fn random_mat<T: TestScalar>(nrows: usize, ncols: usize) -> Mat<T> {
    Mat::from_fn(nrows, ncols, |_, _| random_value())
}

pub fn random_vec<T: TestScalar>(len: usize) -> Vec<T> {
    (0..len).map(|_| random_value()).collect()
}

/// `n × k` matrix whose columns are the full vectors of `k` reflectors, with their unit
/// element and zeros written out.
pub fn random_reflectors<T: TestScalar>(direction: Direction, n: usize, k: usize) -> Mat<T> {
    Mat::from_fn(n, k, |i, j| {
        let unit = match direction {
            Direction::Forward => j,
            Direction::Backward => n - k + j,
        };
        let explicit = match direction {
            Direction::Forward => i > unit,
            Direction::Backward => i < unit,
        };
        if i == unit {
            T::one()
        } else if explicit {
            random_value()
        } else {
            T::zero()
        }
    })
}

/// Diagonals that hold the explicit part of reflectors stored with `storev`.
pub fn reflector_region(direction: Direction, storev: Storage, n: usize, k: usize) -> Access {
    let offset = (n - k) as isize;
    match (direction, storev) {
        (Direction::Forward, Storage::Columnwise) => Access::strict_lower(),
        (Direction::Forward, Storage::Rowwise) => Access::strict_upper(),
        (Direction::Backward, Storage::Columnwise) => Access::band(1 - offset, isize::MAX),
        (Direction::Backward, Storage::Rowwise) => Access::band(isize::MIN, offset - 1),
    }
}

/// Stores reflectors the way the factorizations do, with `NaN` where the unit element and the
/// zeros are implicit.
pub fn store_reflectors<T: TestScalar>(
    reflectors: &Mat<T>,
    direction: Direction,
    storev: Storage,
) -> Mat<T> {
    let n = reflectors.nrows();
    let k = reflectors.ncols();
    let region = reflector_region(direction, storev, n, k);
    match storev {
        Storage::Columnwise => Mat::from_fn(n, k, |i, j| {
            if region.allows(i, j) {
                reflectors.read(i, j)
            } else {
                nan()
            }
        }),
        Storage::Rowwise => Mat::from_fn(k, n, |i, j| {
            if region.allows(i, j) {
                reflectors.read(j, i).conj()
            } else {
                nan()
            }
        }),
    }
}

/// `I - tau v v^H`
pub fn reflector<T: TestScalar>(v: MatRef<'_, T>, tau: T) -> Mat<T> {
    let n = v.nrows();
    Mat::from_fn(n, n, |i, j| {
        let id = if i == j { T::one() } else { T::zero() };
        id - tau * v.read(i, 0) * v.read(j, 0).conj()
    })
}

/// Product of the reflectors, `H_0 ... H_{k-1}` (forward) or `H_{k-1} ... H_0` (backward).
pub fn explicit_block<T: TestScalar>(reflectors: &Mat<T>, tau: &[T], direction: Direction) -> Mat<T> {
    let n = reflectors.nrows();
    let k = reflectors.ncols();
    let mut h = Mat::<T>::identity(n, n);
    for step in 0..k {
        let j = match direction {
            Direction::Forward => step,
            Direction::Backward => k - 1 - step,
        };
        let hj = reflector(reflectors.as_ref().col(j), tau[j]);
        h = h.as_ref() * hj.as_ref();
    }
    h
}

/// `I - V T V^H`
pub fn compact_wy<T: TestScalar>(v: MatRef<'_, T>, t: MatRef<'_, T>) -> Mat<T> {
    let vt = v * t;
    let vh = conj_transpose(v);
    Mat::<T>::identity(v.nrows(), v.nrows()).as_ref() - (vt.as_ref() * vh.as_ref()).as_ref()
}

pub fn conj_transpose<T: TestScalar>(a: MatRef<'_, T>) -> Mat<T> {
    Mat::from_fn(a.ncols(), a.nrows(), |i, j| a.read(j, i).conj())
}

pub fn apply_op<T: TestScalar>(a: MatRef<'_, T>, op: Op) -> Mat<T> {
    match op {
        Op::NoTranspose => a.to_owned(),
        Op::Transpose => a.transpose().to_owned(),
        Op::ConjugateTranspose => conj_transpose(a),
    }
}

pub fn max_abs_diff<T: TestScalar>(a: MatRef<'_, T>, b: MatRef<'_, T>) -> f64 {
    let mut max = 0.0f64;
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            max = max.max((a.read(i, j) - b.read(i, j)).abs());
        }
    }
    max
}

#[track_caller]
pub fn assert_mat_close<T: TestScalar>(a: MatRef<'_, T>, b: MatRef<'_, T>, tol: f64) {
    fancy_assert!((a.nrows(), a.ncols()) == (b.nrows(), b.ncols()));
    let diff = max_abs_diff(a, b);
    fancy_assert!(diff <= tol);
}
