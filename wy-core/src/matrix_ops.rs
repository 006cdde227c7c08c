//! Elementary routines on matrices and vectors, and arithmetic operators on matrix views.
//!
//! Vectors are views with a single row or column; routines taking a vector accept either.

use crate::{
    mul::matmul, ComplexField, Conj, Mat, MatMut, MatRef, MatrixView, MatrixViewMut,
    Parallelism, RealField, Uplo,
};
use assert2::assert as fancy_assert;
use core::ops::{AddAssign, Mul, Sub, SubAssign};
use reborrow::*;

impl<T: ComplexField> AddAssign<MatRef<'_, T>> for MatMut<'_, T> {
    #[track_caller]
    fn add_assign(&mut self, rhs: MatRef<'_, T>) {
        add_assign(self.rb_mut(), rhs);
    }
}

impl<T: ComplexField> SubAssign<MatRef<'_, T>> for MatMut<'_, T> {
    #[track_caller]
    fn sub_assign(&mut self, rhs: MatRef<'_, T>) {
        fancy_assert!((self.nrows(), self.ncols()) == (rhs.nrows(), rhs.ncols()));
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                let value = self.read(i, j) - rhs.read(i, j);
                self.write(i, j, value);
            }
        }
    }
}

impl<T: ComplexField> Sub<MatRef<'_, T>> for MatRef<'_, T> {
    type Output = Mat<T>;

    #[track_caller]
    fn sub(self, rhs: MatRef<'_, T>) -> Self::Output {
        fancy_assert!((self.nrows(), self.ncols()) == (rhs.nrows(), rhs.ncols()));
        Mat::from_fn(self.nrows(), self.ncols(), |i, j| {
            self.read(i, j) - rhs.read(i, j)
        })
    }
}

impl<T: ComplexField> Mul<MatRef<'_, T>> for MatRef<'_, T> {
    type Output = Mat<T>;

    #[track_caller]
    fn mul(self, rhs: MatRef<'_, T>) -> Self::Output {
        let mut out = Mat::zeros(self.nrows(), rhs.ncols());
        matmul(
            out.as_mut(),
            self,
            Conj::No,
            rhs,
            Conj::No,
            None,
            T::one(),
            Parallelism::None,
        );
        out
    }
}

/// Copies `src` into `dst`: the whole matrix, or only its upper or lower trapezoid.
#[track_caller]
pub fn lacpy<Src, Dst>(uplo: Uplo, src: Src, mut dst: Dst)
where
    Src: MatrixView,
    Dst: MatrixViewMut<Elem = Src::Elem>,
{
    fancy_assert!(src.nrows() == dst.nrows());
    fancy_assert!(src.ncols() == dst.ncols());
    for j in 0..src.ncols() {
        let rows = match uplo {
            Uplo::General => 0..src.nrows(),
            Uplo::Upper => 0..Ord::min(j + 1, src.nrows()),
            Uplo::Lower => Ord::min(j, src.nrows())..src.nrows(),
        };
        for i in rows {
            dst.write(i, j, src.read(i, j));
        }
    }
}

/// Sets the off-diagonal elements of the selected part of `dst` to `off_diag` and its
/// diagonal to `diag`.
pub fn laset<T: ComplexField>(uplo: Uplo, off_diag: T, diag: T, mut dst: MatMut<'_, T>) {
    for j in 0..dst.ncols() {
        for i in 0..dst.nrows() {
            let selected = match uplo {
                Uplo::General => true,
                Uplo::Upper => i <= j,
                Uplo::Lower => i >= j,
            };
            if i == j {
                dst.write(i, j, diag);
            } else if selected {
                dst.write(i, j, off_diag);
            }
        }
    }
}

/// `x := alpha * x`
pub fn scal<T: ComplexField>(alpha: T, mut x: MatMut<'_, T>) {
    for j in 0..x.ncols() {
        for i in 0..x.nrows() {
            let value = alpha * x.read(i, j);
            x.write(i, j, value);
        }
    }
}

/// `dst := dst + src`
#[track_caller]
pub fn add_assign<T: ComplexField>(mut dst: MatMut<'_, T>, src: MatRef<'_, T>) {
    fancy_assert!((dst.nrows(), dst.ncols()) == (src.nrows(), src.ncols()));
    for j in 0..dst.ncols() {
        for i in 0..dst.nrows() {
            let value = dst.read(i, j) + src.read(i, j);
            dst.write(i, j, value);
        }
    }
}

/// Conjugates every element of `x` in place. No-op for real types.
pub fn lacgv<T: ComplexField>(mut x: MatMut<'_, T>) {
    if !T::IS_COMPLEX {
        return;
    }
    for j in 0..x.ncols() {
        for i in 0..x.nrows() {
            let value = x.read(i, j).conj();
            x.write(i, j, value);
        }
    }
}

/// Rank-1 update `a := a + alpha * x * conj_y(y)^T`, where `x` and `y` are column vectors.
///
/// With `conj_y == Conj::Yes` this is `a += alpha x y^H`.
#[track_caller]
pub fn ger<T: ComplexField>(
    alpha: T,
    x: MatRef<'_, T>,
    y: MatRef<'_, T>,
    conj_y: Conj,
    mut a: MatMut<'_, T>,
) {
    fancy_assert!(x.ncols() == 1);
    fancy_assert!(y.ncols() == 1);
    fancy_assert!(a.nrows() == x.nrows());
    fancy_assert!(a.ncols() == y.nrows());
    for j in 0..a.ncols() {
        let scale = alpha * conj_y.apply(y.read(j, 0));
        for i in 0..a.nrows() {
            let value = a.read(i, j) + x.read(i, 0) * scale;
            a.write(i, j, value);
        }
    }
}

/// Euclidean norm of all the elements of `x`, computed without intermediate overflow or
/// harmful underflow.
pub fn nrm2<T: ComplexField>(x: MatRef<'_, T>) -> T::Real {
    let zero = <T::Real as ComplexField>::zero();
    let one = <T::Real as ComplexField>::one();
    let mut scale = zero;
    let mut ssq = one;

    let mut accumulate = |part: T::Real| {
        if part != zero {
            let abs = part.abs();
            if scale < abs {
                let ratio = scale / abs;
                ssq = one + ssq * ratio * ratio;
                scale = abs;
            } else {
                let ratio = abs / scale;
                ssq = ssq + ratio * ratio;
            }
        }
    };

    for j in 0..x.ncols() {
        for i in 0..x.nrows() {
            let (re, im) = x.read(i, j).into_real_imag();
            accumulate(re);
            accumulate(im);
        }
    }
    scale * ssq.sqrt()
}

/// Scales `x` by `1 / alpha` without producing spurious overflow or underflow.
///
/// `alpha` may be complex. When `1 / alpha` would not be representable, the scaling is split
/// into two steps through [`RealField::safe_min`] and [`RealField::safe_max`].
pub fn rscl<T: ComplexField>(alpha: T, x: MatMut<'_, T>) {
    let (re, im) = alpha.into_real_imag();
    let zero = <T::Real as ComplexField>::zero();

    if im == zero {
        rscl_real(re, x);
        return;
    }

    let safe_min = T::Real::safe_min();
    let safe_max = T::Real::safe_max();
    let from = T::from_real_imag;

    if re == zero {
        // alpha is purely imaginary
        let mut x = x;
        if im.abs() < safe_min {
            scal(from(zero, -safe_max), x.rb_mut());
            rscl_real(im * safe_max, x);
        } else if im.abs() > safe_max {
            scal(from(zero, -safe_min), x.rb_mut());
            rscl_real(im * safe_min, x);
        } else {
            scal(from(zero, -(im.inv())), x);
        }
        return;
    }

    // 1/alpha = conj(alpha) / |alpha|^2, computed as (re / d, -im / d)
    let abs_re = re.abs();
    let abs_im = im.abs();
    let (small, big) = if abs_re < abs_im {
        (abs_re, abs_im)
    } else {
        (abs_im, abs_re)
    };
    let ratio = small / big;
    let d = big * (<T::Real as ComplexField>::one() + ratio * ratio).sqrt();
    let inv_re = re / d / d;
    let inv_im = -im / d / d;

    if inv_re.abs() < safe_min
        || inv_im.abs() < safe_min
        || inv_re.abs() > safe_max
        || inv_im.abs() > safe_max
    {
        // scale in two steps so that neither factor leaves the safe range
        let mut x = x;
        let alpha_scaled = from(re * safe_min, im * safe_min);
        scal(alpha_scaled.inv(), x.rb_mut());
        scal(T::from_real(safe_min), x);
    } else {
        scal(from(inv_re, inv_im), x);
    }
}

fn rscl_real<T: ComplexField>(alpha: T::Real, mut x: MatMut<'_, T>) {
    let safe_min = T::Real::safe_min();
    let safe_max = T::Real::safe_max();
    let abs = alpha.abs();

    if abs > safe_max {
        scal(T::from_real(safe_min), x.rb_mut());
        scal(T::from_real(safe_max / alpha), x);
    } else if abs < safe_min {
        scal(T::from_real(safe_max), x.rb_mut());
        scal(T::from_real(safe_min / alpha), x);
    } else {
        scal(T::from_real(alpha.inv()), x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{c64, mat};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn copy_triangles() {
        let src = mat![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0f64]];

        let mut upper = Mat::<f64>::zeros(3, 3);
        lacpy(Uplo::Upper, src.as_ref(), upper.as_mut());
        fancy_assert!(upper == mat![[1.0, 2.0, 3.0], [0.0, 5.0, 6.0], [0.0, 0.0, 9.0]]);

        let mut lower = Mat::<f64>::zeros(3, 3);
        lacpy(Uplo::Lower, src.as_ref(), lower.as_mut());
        fancy_assert!(lower == mat![[1.0, 0.0, 0.0], [4.0, 5.0, 0.0], [7.0, 8.0, 9.0]]);

        let mut all = Mat::<f64>::zeros(2, 2);
        lacpy(Uplo::General, src.as_ref().submatrix(1, 1, 2, 2), all.as_mut());
        fancy_assert!(all == mat![[5.0, 6.0], [8.0, 9.0]]);
    }

    #[test]
    fn set_parts() {
        let mut a = Mat::<f64>::from_fn(3, 4, |_, _| 7.0);
        laset(Uplo::Lower, 0.0, 1.0, a.as_mut());
        fancy_assert!(
            a == mat![
                [1.0, 7.0, 7.0, 7.0],
                [0.0, 1.0, 7.0, 7.0],
                [0.0, 0.0, 1.0, 7.0],
            ]
        );
        laset(Uplo::General, 2.0, 3.0, a.as_mut());
        fancy_assert!(a.read(0, 3) == 2.0);
        fancy_assert!(a.read(2, 0) == 2.0);
        fancy_assert!(a.read(1, 1) == 3.0);
    }

    #[test]
    fn operators() {
        let a = mat![[1.0, 2.0], [3.0, 4.0f64]];
        let b = mat![[0.5, 0.0], [1.0, -1.0f64]];
        fancy_assert!(a.as_ref() * b.as_ref() == mat![[2.5, -2.0], [5.5, -4.0]]);
        fancy_assert!(a.as_ref() - b.as_ref() == mat![[0.5, 2.0], [2.0, 5.0]]);

        let mut c = a.clone();
        {
            let mut view = c.as_mut();
            view += b.as_ref();
            view -= a.as_ref();
        }
        fancy_assert!(c == b);
    }

    #[test]
    fn conjugate_and_rank_one() {
        let mut x = mat![[c64::new(1.0, 2.0)], [c64::new(-3.0, 0.5)]];
        lacgv(x.as_mut());
        fancy_assert!(x.read(0, 0) == c64::new(1.0, -2.0));
        fancy_assert!(x.read(1, 0) == c64::new(-3.0, -0.5));

        let y = mat![[c64::new(0.0, 1.0)], [c64::new(2.0, 0.0)], [c64::new(1.0, 1.0)]];
        let mut a = Mat::<c64>::zeros(2, 3);
        ger(c64::new(2.0, 0.0), x.as_ref(), y.as_ref(), Conj::Yes, a.as_mut());
        for i in 0..2 {
            for j in 0..3 {
                let expected = c64::new(2.0, 0.0) * x.read(i, 0) * y.read(j, 0).conj();
                assert_approx_eq!(a.read(i, j).re, expected.re);
                assert_approx_eq!(a.read(i, j).im, expected.im);
            }
        }
    }

    #[test]
    fn norm_does_not_overflow() {
        let x = mat![[3.0e300], [4.0e300f64]];
        assert_approx_eq!(nrm2(x.as_ref()) / 1.0e300, 5.0);

        let x = mat![[3.0e-300], [4.0e-300f64]];
        assert_approx_eq!(nrm2(x.as_ref()) / 1.0e-300, 5.0);

        let z = mat![[c64::new(1.0, 2.0), c64::new(2.0, 0.0), c64::new(0.0, 4.0)]];
        assert_approx_eq!(nrm2(z.as_ref()), 5.0);

        fancy_assert!(nrm2(Mat::<f64>::zeros(3, 1).as_ref()) == 0.0);
    }

    #[test]
    fn reciprocal_scaling() {
        let mut x = mat![[1.0, -2.0f64]];
        rscl(4.0, x.as_mut());
        fancy_assert!(x == mat![[0.25, -0.5]]);

        // 1 / 1e-310 overflows, but the scaled result does not
        let mut x = mat![[1.0e-300f64]];
        rscl(1.0e-310, x.as_mut());
        assert_approx_eq!(x.read(0, 0) / 1.0e10, 1.0);

        let alpha = c64::new(1.0, -2.0);
        let mut z = mat![[c64::new(3.0, 1.0)], [c64::new(0.0, -1.0)]];
        let expected = [c64::new(3.0, 1.0) / alpha, c64::new(0.0, -1.0) / alpha];
        rscl(alpha, z.as_mut());
        for (i, expected) in expected.iter().enumerate() {
            assert_approx_eq!(z.read(i, 0).re, expected.re);
            assert_approx_eq!(z.read(i, 0).im, expected.im);
        }

        let mut z = mat![[c64::new(2.0, 2.0)]];
        rscl(c64::new(0.0, 2.0), z.as_mut());
        assert_approx_eq!(z.read(0, 0).re, 1.0);
        assert_approx_eq!(z.read(0, 0).im, -1.0);

        let tiny = c64::new(1.0e-300, 1.0e-300);
        let mut z = mat![[c64::new(1.0e-300, 0.0)]];
        rscl(tiny, z.as_mut());
        assert_approx_eq!(z.read(0, 0).re, 0.5);
        assert_approx_eq!(z.read(0, 0).im, -0.5);
    }
}
