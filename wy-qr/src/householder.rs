//! Elementary Householder reflectors.
//!
//! A reflector is `H = I - tau * v * v^H`, where `v` has an implicit unit leading element
//! (trailing element for reflectors annihilating towards the end of a row, as in the RQ
//! factorization). A block of `k` reflectors is stored as the columns of `V` (columnwise) or
//! as the conjugated rows of `V` (rowwise); [`larft`] forms the triangular factor `T` so that
//! the product of the block is `I - V T V^H`.

use assert2::assert as fancy_assert;
use reborrow::*;
use wy_core::{
    lapack_check,
    matrix_ops::{ger, nrm2, rscl, scal},
    mul::{
        gemv,
        triangular::{trmv, BlockStructure},
    },
    ComplexField, Conj, Direction, LapackError, MatMut, MatRef, Op, Parallelism, RealField, Side,
    Storage,
};

/// Generates an elementary reflector `H` such that `H^H * [alpha; x] = [beta; 0]`, where
/// `beta` is real.
///
/// On return, `x` holds the tail of `v` (its head is an implicit one), and the function
/// returns `(tau, beta)`. If `x` is zero and `alpha` is real, `tau` is zero and `H` is the
/// identity.
///
/// `x` may be a row or a column.
pub fn larfg<T: ComplexField>(alpha: T, mut x: MatMut<'_, T>) -> (T, T) {
    let zero = <T::Real as ComplexField>::zero();

    let mut x_norm = nrm2(x.rb());
    let (mut alpha_re, mut alpha_im) = alpha.into_real_imag();

    if x_norm == zero && alpha_im == zero {
        return (T::zero(), alpha);
    }

    let mut beta = -copysign(norm3(alpha_re, alpha_im, x_norm), alpha_re);
    let safe_min = T::Real::safe_min() / T::Real::epsilon();
    let safe_min_inv = safe_min.inv();

    // beta may be inaccurate if it is subnormal: rescale until it is not
    let mut count = 0usize;
    if beta.abs() < safe_min {
        while beta.abs() < safe_min && count < 20 {
            count += 1;
            scal(T::from_real(safe_min_inv), x.rb_mut());
            beta = beta * safe_min_inv;
            alpha_re = alpha_re * safe_min_inv;
            alpha_im = alpha_im * safe_min_inv;
        }
        x_norm = nrm2(x.rb());
        beta = -copysign(norm3(alpha_re, alpha_im, x_norm), alpha_re);
    }

    let tau = T::from_real_imag((beta - alpha_re) / beta, -alpha_im / beta);
    rscl(
        T::from_real_imag(alpha_re, alpha_im) - T::from_real(beta),
        x.rb_mut(),
    );

    for _ in 0..count {
        beta = beta * safe_min;
    }

    (tau, T::from_real(beta))
}

/// `|value|` with the sign of `sign`.
fn copysign<R: RealField>(value: R, sign: R) -> R {
    let value = value.abs();
    if sign < R::zero() {
        -value
    } else {
        value
    }
}

/// `sqrt(a² + b² + c²)` without intermediate overflow.
fn norm3<R: RealField>(a: R, b: R, c: R) -> R {
    let a = a.abs();
    let b = b.abs();
    let c = c.abs();
    let mut max = a;
    if b > max {
        max = b;
    }
    if c > max {
        max = c;
    }
    if max == R::zero() {
        return max;
    }
    let (a, b, c) = (a / max, b / max, c / max);
    max * (a * a + b * b + c * c).sqrt()
}

/// Returns the scratch size needed by [`larf`].
pub fn larf_worksize<T: ComplexField>(side: Side, c: MatRef<'_, T>) -> usize {
    match side {
        Side::Left => c.ncols(),
        Side::Right => c.nrows(),
    }
}

/// Applies the reflector `H = I - tau * v * v^H` to `c`, from the left (`c := H c`) or from
/// the right (`c := c H`).
///
/// `v` is a column vector holding every element of the reflector, including the unit one.
/// `work` must hold at least [`larf_worksize`] elements.
#[track_caller]
pub fn larf<T: ComplexField>(
    side: Side,
    v: MatRef<'_, T>,
    tau: T,
    mut c: MatMut<'_, T>,
    work: &mut [T],
) {
    fancy_assert!(v.ncols() == 1);
    match side {
        Side::Left => {
            fancy_assert!(v.nrows() == c.nrows());
        }
        Side::Right => {
            fancy_assert!(v.nrows() == c.ncols());
        }
    }
    if tau == T::zero() || c.nrows() == 0 || c.ncols() == 0 {
        return;
    }

    let len = larf_worksize(side, c.rb());
    fancy_assert!(work.len() >= len);
    let mut w = MatMut::from_column_major_slice(&mut work[..len], len, 1);

    match side {
        Side::Left => {
            // w := c^H v, c := c - tau v w^H
            gemv(
                Op::ConjugateTranspose,
                T::one(),
                c.rb(),
                v,
                T::zero(),
                w.rb_mut(),
                Parallelism::None,
            );
            ger(-tau, v, w.rb(), Conj::Yes, c);
        }
        Side::Right => {
            // w := c v, c := c - tau w v^H
            gemv(
                Op::NoTranspose,
                T::one(),
                c.rb(),
                v,
                T::zero(),
                w.rb_mut(),
                Parallelism::None,
            );
            ger(-tau, w.rb(), v, Conj::Yes, c);
        }
    }
}

/// Forms the triangular factor `T` of a block of `k = tau.len()` reflectors, so that the
/// product of the block is `H = I - V T V^H`.
///
/// With `Direction::Forward`, `H = H_0 H_1 ... H_{k-1}` and `T` is upper triangular; with
/// `Direction::Backward`, `H = H_{k-1} ... H_1 H_0` and `T` is lower triangular. Only the
/// part of `V` that does not hold the implicit unit diagonal and zeros is read, and only the
/// used triangle of `T` is written.
///
/// `V` is `n × k` (columnwise) or `k × n` (rowwise), with the unit diagonal of the block at
/// the top (forward) or bottom (backward) of the reflectors.
pub fn larft<T: ComplexField>(
    direction: Direction,
    storev: Storage,
    v: MatRef<'_, T>,
    tau: &[T],
    mut t: MatMut<'_, T>,
) -> Result<(), LapackError> {
    const ROUTINE: &str = "larft";

    let k = tau.len();
    // view the reflectors as columns, conjugating rowwise storage
    let (vc, conj) = match storev {
        Storage::Columnwise => (v, Conj::No),
        Storage::Rowwise => (v.transpose(), Conj::Yes),
    };
    let n = vc.nrows();

    lapack_check!(vc.ncols() == k, ROUTINE, 3);
    lapack_check!(k <= n, ROUTINE, 3);
    lapack_check!(t.nrows() == k && t.ncols() == k, ROUTINE, 5);

    let zero = T::zero();
    let vc_at = |i: usize, j: usize| conj.apply(vc.read(i, j));

    match direction {
        Direction::Forward => {
            for i in 0..k {
                let tau_i = tau[i];
                if tau_i == zero {
                    for j in 0..=i {
                        t.write(j, i, zero);
                    }
                    continue;
                }

                // t[0..i, i] := -tau_i * vc[i.., 0..i]^H * vc[i.., i]
                for j in 0..i {
                    let mut acc = vc_at(i, j).conj();
                    for r in i + 1..n {
                        acc = acc + vc_at(r, j).conj() * vc_at(r, i);
                    }
                    t.write(j, i, -tau_i * acc);
                }

                // t[0..i, i] := t[0..i, 0..i] * t[0..i, i]
                if i > 0 {
                    let (t_left, t_right) = t.rb_mut().split_at_col(i);
                    trmv(
                        BlockStructure::TriangularUpper,
                        Op::NoTranspose,
                        t_left.rb().submatrix(0, 0, i, i),
                        t_right.submatrix(0, 0, i, 1),
                    );
                }
                t.write(i, i, tau_i);
            }
        }
        Direction::Backward => {
            for i in (0..k).rev() {
                let tau_i = tau[i];
                if tau_i == zero {
                    for j in i..k {
                        t.write(j, i, zero);
                    }
                    continue;
                }

                if i + 1 < k {
                    // reflector i has its unit element at row p and zeros below it
                    let p = n - k + i;

                    // t[i+1.., i] := -tau_i * vc[..=p, i+1..]^H * vc[..=p, i]
                    for j in i + 1..k {
                        let mut acc = vc_at(p, j).conj();
                        for r in 0..p {
                            acc = acc + vc_at(r, j).conj() * vc_at(r, i);
                        }
                        t.write(j, i, -tau_i * acc);
                    }

                    // t[i+1.., i] := t[i+1.., i+1..] * t[i+1.., i]
                    let (t_left, t_right) = t.rb_mut().split_at_col(i + 1);
                    let len = k - i - 1;
                    trmv(
                        BlockStructure::TriangularLower,
                        Op::NoTranspose,
                        t_right.rb().submatrix(i + 1, 0, len, len),
                        t_left.submatrix(i + 1, i, len, 1),
                    );
                }
                t.write(i, i, tau_i);
            }
        }
    }

    Ok(())
}
