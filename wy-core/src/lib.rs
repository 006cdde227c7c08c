//! `wy` core module.
//!
//! This module contains:
//! - the scalar traits ([`ComplexField`], [`RealField`]) and their implementations for
//!   `f32`, `f64`, [`c32`] and [`c64`],
//! - definitions of matrix structures ([`MatRef`], [`MatMut`], [`Mat`]) and of their
//!   access policies ([`Access`]),
//! - the workspace sizing protocol ([`workspace::WorkInfo`]),
//! - matrix multiplication and triangular multiplication routines,
//! - elementary routines on matrices and vectors.

#![warn(rust_2018_idioms)]
#![allow(clippy::too_many_arguments)]

use core::{
    fmt::Debug,
    ops::{Add, Div, Mul, Neg, Sub},
};
use num_complex::Complex;
use num_traits::Float;

pub mod access;
pub mod error;
pub mod matrix_ops;
pub mod mul;
pub mod workspace;

mod mat;

pub use access::Access;
pub use error::LapackError;
pub use mat::{AsMatMut, AsMatRef, Mat, MatMut, MatRef, MatrixView, MatrixViewMut};

/// Complex floating point number type, where the real and imaginary parts each occupy 32 bits.
#[allow(non_camel_case_types)]
pub type c32 = Complex<f32>;
/// Complex floating point number type, where the real and imaginary parts each occupy 64 bits.
#[allow(non_camel_case_types)]
pub type c64 = Complex<f64>;

/// Indicates whether the corresponding operand should be conjugated or not.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Conj {
    /// Do not conjugate
    No,
    /// Do conjugate
    Yes,
}

impl Conj {
    /// Applies the conjugation to a single value.
    #[inline(always)]
    pub fn apply<T: ComplexField>(self, value: T) -> T {
        match self {
            Conj::No => value,
            Conj::Yes => value.conj(),
        }
    }
}

/// Which side of the target matrix a transformation is applied from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    /// `C := op(H) C`
    Left,
    /// `C := C op(H)`
    Right,
}

/// Transformation applied to an operand before it is used.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    NoTranspose,
    Transpose,
    ConjugateTranspose,
}

impl Op {
    #[inline]
    pub fn is_transposed(self) -> bool {
        self != Op::NoTranspose
    }

    /// Maps `NoTranspose` to `ConjugateTranspose` and both transposed forms to
    /// `NoTranspose`.
    #[inline]
    pub fn flipped(self) -> Op {
        match self {
            Op::NoTranspose => Op::ConjugateTranspose,
            Op::Transpose | Op::ConjugateTranspose => Op::NoTranspose,
        }
    }
}

/// Order in which the elementary reflectors of a block are composed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// `H = H_0 H_1 ... H_{k-1}`
    Forward,
    /// `H = H_{k-1} ... H_1 H_0`
    Backward,
}

/// Layout of the reflector vectors inside `V`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Storage {
    /// Reflector `i` is column `i` of `V`.
    Columnwise,
    /// Reflector `i` is row `i` of `V`, stored conjugated.
    Rowwise,
}

/// Part of a matrix an operation refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Uplo {
    Upper,
    Lower,
    General,
}

/// Parallelism strategy that can be passed to most of the routines in the library.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parallelism {
    /// No parallelism.
    ///
    /// The code is executed sequentially on the same thread that calls a function
    /// and passes this argument.
    None,
    /// Rayon parallelism.
    ///
    /// The code is possibly executed in parallel on the current thread, as well as the currently
    /// active rayon thread pool.
    ///
    /// The contained value represents a hint about the number of threads an implementation should
    /// use, but there is no way to guarantee how many or which threads will be used.
    ///
    /// A value of `0` treated as equivalent to `rayon::current_num_threads()`.
    Rayon(usize),
}

impl Default for Parallelism {
    #[inline]
    fn default() -> Self {
        Parallelism::None
    }
}

/// Runs both closures, possibly in parallel, splitting the thread budget between them.
#[inline]
pub fn join_raw(
    op_a: impl Send + FnOnce(Parallelism),
    op_b: impl Send + FnOnce(Parallelism),
    parallelism: Parallelism,
) {
    match parallelism {
        Parallelism::None => (op_a(parallelism), op_b(parallelism)),
        Parallelism::Rayon(n_threads) => {
            if n_threads == 1 {
                (op_a(Parallelism::None), op_b(Parallelism::None))
            } else {
                let n_threads = if n_threads > 0 {
                    n_threads
                } else {
                    rayon::current_num_threads()
                };
                let parallelism = Parallelism::Rayon(n_threads - n_threads / 2);
                rayon::join(|| op_a(parallelism), || op_b(parallelism))
            }
        }
    };
}

#[inline]
#[doc(hidden)]
pub fn parallelism_degree(parallelism: Parallelism) -> usize {
    match parallelism {
        Parallelism::None => 1,
        Parallelism::Rayon(0) => rayon::current_num_threads(),
        Parallelism::Rayon(n_threads) => n_threads,
    }
}

/// Trait for types that behave like complex numbers (real numbers included).
pub trait ComplexField:
    bytemuck::Pod
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Send
    + Sync
    + Debug
    + 'static
{
    /// Type of the real and imaginary parts.
    type Real: RealField;

    const IS_COMPLEX: bool;

    fn from_real(real: Self::Real) -> Self;
    /// For real types, `imag` must be zero.
    fn from_real_imag(real: Self::Real, imag: Self::Real) -> Self;
    fn into_real_imag(self) -> (Self::Real, Self::Real);

    #[inline(always)]
    fn real(self) -> Self::Real {
        self.into_real_imag().0
    }
    #[inline(always)]
    fn imag(self) -> Self::Real {
        self.into_real_imag().1
    }

    fn zero() -> Self;
    fn one() -> Self;
    fn inv(self) -> Self;
    fn conj(self) -> Self;
    fn sqrt(self) -> Self;

    #[inline(always)]
    fn scale(self, factor: Self::Real) -> Self {
        self * Self::from_real(factor)
    }

    /// Squared modulus, `re² + im²`.
    #[inline(always)]
    fn abs2(self) -> Self::Real {
        let (re, im) = self.into_real_imag();
        re * re + im * im
    }

    /// Modulus, computed without intermediate overflow.
    fn abs(self) -> Self::Real;
}

/// Trait for real floating point types.
pub trait RealField: ComplexField<Real = Self> + PartialOrd {
    /// Machine epsilon.
    fn epsilon() -> Self;
    /// Smallest positive value whose reciprocal does not overflow.
    fn safe_min() -> Self;
    /// Reciprocal of [`RealField::safe_min`].
    #[inline]
    fn safe_max() -> Self {
        Self::safe_min().inv()
    }
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_real_field {
    ($real: ty) => {
        impl ComplexField for $real {
            type Real = $real;

            const IS_COMPLEX: bool = false;

            #[inline(always)]
            fn from_real(real: Self::Real) -> Self {
                real
            }
            #[inline(always)]
            fn from_real_imag(real: Self::Real, imag: Self::Real) -> Self {
                debug_assert!(imag == 0.0);
                real
            }
            #[inline(always)]
            fn into_real_imag(self) -> (Self::Real, Self::Real) {
                (self, 0.0)
            }
            #[inline(always)]
            fn zero() -> Self {
                0.0
            }
            #[inline(always)]
            fn one() -> Self {
                1.0
            }
            #[inline(always)]
            fn inv(self) -> Self {
                1.0 / self
            }
            #[inline(always)]
            fn conj(self) -> Self {
                self
            }
            #[inline(always)]
            fn sqrt(self) -> Self {
                Float::sqrt(self)
            }
            #[inline(always)]
            fn abs(self) -> Self::Real {
                Float::abs(self)
            }
        }

        impl RealField for $real {
            #[inline(always)]
            fn epsilon() -> Self {
                <$real as Float>::epsilon()
            }
            #[inline]
            fn safe_min() -> Self {
                let tiny = <$real as Float>::min_positive_value();
                let small = 1.0 / <$real as Float>::max_value();
                if small >= tiny {
                    small * (1.0 + <$real as Float>::epsilon())
                } else {
                    tiny
                }
            }
            #[inline(always)]
            fn from_f64(value: f64) -> Self {
                value as $real
            }
        }
    };
}

macro_rules! impl_complex_field {
    ($real: ty) => {
        impl ComplexField for Complex<$real> {
            type Real = $real;

            const IS_COMPLEX: bool = true;

            #[inline(always)]
            fn from_real(real: Self::Real) -> Self {
                Complex::new(real, 0.0)
            }
            #[inline(always)]
            fn from_real_imag(real: Self::Real, imag: Self::Real) -> Self {
                Complex::new(real, imag)
            }
            #[inline(always)]
            fn into_real_imag(self) -> (Self::Real, Self::Real) {
                (self.re, self.im)
            }
            #[inline(always)]
            fn zero() -> Self {
                Complex::new(0.0, 0.0)
            }
            #[inline(always)]
            fn one() -> Self {
                Complex::new(1.0, 0.0)
            }
            #[inline(always)]
            fn inv(self) -> Self {
                Complex::<$real>::inv(&self)
            }
            #[inline(always)]
            fn conj(self) -> Self {
                Complex::new(self.re, -self.im)
            }
            #[inline(always)]
            fn sqrt(self) -> Self {
                Complex::<$real>::sqrt(self)
            }
            #[inline(always)]
            fn abs(self) -> Self::Real {
                Float::hypot(self.re, self.im)
            }
        }
    };
}

impl_real_field!(f32);
impl_real_field!(f64);
impl_complex_field!(f32);
impl_complex_field!(f64);

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert as fancy_assert;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn safe_min_reciprocal_is_finite() {
        fancy_assert!(f64::safe_min() == f64::MIN_POSITIVE);
        fancy_assert!(f64::safe_max().is_finite());
        fancy_assert!(f32::safe_max().is_finite());
        fancy_assert!(f32::safe_min() > 0.0);
    }

    #[test]
    fn complex_arithmetic() {
        let z = c64::new(3.0, -4.0);
        assert_approx_eq!(z.abs(), 5.0);
        assert_approx_eq!(z.abs2(), 25.0);
        fancy_assert!(z.conj() == c64::new(3.0, 4.0));
        let w = z * z.inv();
        assert_approx_eq!(w.re, 1.0);
        assert_approx_eq!(w.im, 0.0);
        let s = c64::new(-1.0, 0.0).sqrt();
        assert_approx_eq!(s.re, 0.0);
        assert_approx_eq!(s.im, 1.0);
        fancy_assert!(c64::from_real_imag(1.0, 2.0).into_real_imag() == (1.0, 2.0));
    }

    #[test]
    fn conj_and_op() {
        fancy_assert!(Conj::Yes.apply(c32::new(1.0, 2.0)) == c32::new(1.0, -2.0));
        fancy_assert!(Conj::Yes.apply(2.0f64) == 2.0);
        fancy_assert!(Op::NoTranspose.flipped() == Op::ConjugateTranspose);
        fancy_assert!(Op::Transpose.flipped() == Op::NoTranspose);
        fancy_assert!(!Op::NoTranspose.is_transposed());
    }

    #[test]
    fn join_raw_runs_both() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let count = AtomicUsize::new(0);
        for parallelism in [Parallelism::None, Parallelism::Rayon(0), Parallelism::Rayon(1)] {
            join_raw(
                |_| {
                    count.fetch_add(1, Ordering::Relaxed);
                },
                |_| {
                    count.fetch_add(1, Ordering::Relaxed);
                },
                parallelism,
            );
        }
        fancy_assert!(count.load(Ordering::Relaxed) == 6);
        fancy_assert!(parallelism_degree(Parallelism::Rayon(3)) == 3);
    }
}
