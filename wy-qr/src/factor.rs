//! QR, LQ and RQ factorizations producing reflectors in the layout expected by
//! [`ungqr`](crate::ungqr::ungqr), [`unmlq`](crate::unmlq::unmlq) and
//! [`unmrq`](crate::unmrq::unmrq).
//!
//! - QR: `A = Q R`, the reflectors are stored below the diagonal of the first `k` columns.
//! - LQ: `A = L Q`, the conjugated reflectors are stored right of the diagonal of the first
//!   `k` rows.
//! - RQ: `A = R Q`, the conjugated reflectors are stored left of the trailing diagonal of the
//!   last `k` rows.
//!
//! In every case `k = min(m, n)` and `tau` must have length `k`.

use crate::{
    householder::{larf, larf_worksize, larfg, larft},
    larfb::{larfb_work, larfb_worksize},
};
use reborrow::*;
use wy_core::{
    lapack_check,
    matrix_ops::lacgv,
    workspace::{acquire, carve, GeqrfParams, WorkInfo},
    Access, ComplexField, Direction, LapackError, MatMut, MatRef, Op, Side, Storage,
};

/// Returns the scratch shape needed by [`geqr2`].
pub fn geqr2_worksize<T: ComplexField>(a: MatRef<'_, T>) -> WorkInfo {
    WorkInfo::new(a.ncols(), 1)
}

/// Unblocked QR factorization of the `m × n` matrix `a`.
///
/// On return, the upper trapezoid of `a` holds `R` and the part below the diagonal holds the
/// reflectors of `Q = H_0 H_1 ... H_{k-1}`, with `H_i = I - tau_i v_i v_i^H`.
///
/// # Errors
///
/// Returns [`LapackError::InvalidArgument`] if `tau.len() != min(m, n)` (position 2) or if
/// `work` is smaller than [`geqr2_worksize`] (position 3).
pub fn geqr2<T: ComplexField>(
    mut a: MatMut<'_, T>,
    tau: &mut [T],
    work: &mut [T],
) -> Result<(), LapackError> {
    const ROUTINE: &str = "geqr2";

    let m = a.nrows();
    let n = a.ncols();
    let k = Ord::min(m, n);
    lapack_check!(tau.len() == k, ROUTINE, 2);
    lapack_check!(work.len() >= geqr2_worksize(a.rb()).size(), ROUTINE, 3);

    for i in 0..k {
        let alpha = a.read(i, i);
        let (tau_i, beta) = larfg(alpha, a.rb_mut().submatrix(i + 1, i, m - i - 1, 1));
        tau[i] = tau_i;

        if i + 1 < n {
            a.write(i, i, T::one());
            let (left, right) = a.rb_mut().split_at_col(i + 1);
            let v = left.rb().submatrix(i, i, m - i, 1);
            let c = right.submatrix(i, 0, m - i, n - i - 1);
            let len = larf_worksize(Side::Left, c.rb());
            larf(Side::Left, v, tau_i.conj(), c, &mut work[..len]);
        }
        a.write(i, i, beta);
    }

    Ok(())
}

/// Returns the scratch shape needed by [`geqrf`].
pub fn geqrf_worksize<T: ComplexField>(a: MatRef<'_, T>, params: &GeqrfParams<'_, T>) -> WorkInfo {
    let m = a.nrows();
    let n = a.ncols();
    let k = Ord::min(m, n);
    let nb = Ord::min(Ord::max(params.blocksize, 1), k);
    if nb == 0 {
        return WorkInfo::EMPTY;
    }

    let mut info = WorkInfo::EMPTY;
    if nb < n {
        info += WorkInfo::new(nb, nb);
        info += WorkInfo::new(nb, n - nb);
    }
    info.min_max(geqr2_worksize(a.submatrix(0, 0, m, nb)))
}

/// Blocked QR factorization of the `m × n` matrix `a`, with the same output layout as
/// [`geqr2`].
///
/// Each block of `params.blocksize` columns is factored with [`geqr2`], and its reflectors are
/// applied to the trailing columns as a block reflector.
///
/// # Errors
///
/// Returns [`LapackError::InvalidArgument`] if `tau.len() != min(m, n)` (position 2) or the
/// block size is zero (position 3).
pub fn geqrf<T: ComplexField>(
    mut a: MatMut<'_, T>,
    tau: &mut [T],
    params: GeqrfParams<'_, T>,
) -> Result<(), LapackError> {
    const ROUTINE: &str = "geqrf";

    let m = a.nrows();
    let n = a.ncols();
    let k = Ord::min(m, n);
    lapack_check!(a.access().is_dense_for(m, n), ROUTINE, 1);
    lapack_check!(tau.len() == k, ROUTINE, 2);
    lapack_check!(params.blocksize >= 1, ROUTINE, 3);
    if k == 0 {
        return Ok(());
    }

    let info = geqrf_worksize(a.rb(), &params);
    let nb = Ord::min(params.blocksize, k);
    log::debug!("geqrf: m={m} n={n} nb={nb}, work {}×{}", info.m, info.n);

    let mut mem = None;
    let (mut stack, _) = acquire::<T>(info, params.work, &mut mem);

    for i in (0..k).step_by(nb) {
        let ib = Ord::min(nb, k - i);
        log::trace!("geqrf: block {i}..{}", i + ib);

        let (left, right) = a.rb_mut().split_at_col(i + ib);
        let mut panel = left.submatrix(i, i, m - i, ib);
        {
            let (work, _) = stack.rb_mut().make_raw::<T>(ib);
            geqr2(panel.rb_mut(), &mut tau[i..i + ib], work)?;
        }

        if i + ib < n {
            let v = panel.into_const().with_access(Access::strict_lower());
            let (mut t, stack) = carve::<T>(stack.rb_mut(), ib, ib);
            larft(
                Direction::Forward,
                Storage::Columnwise,
                v,
                &tau[i..i + ib],
                t.rb_mut(),
            )?;
            let t = t.into_const().with_access(Access::upper());

            let c = right.submatrix(i, 0, m - i, n - i - ib);
            let need = larfb_worksize(
                Side::Left,
                Op::ConjugateTranspose,
                Direction::Forward,
                Storage::Columnwise,
                v,
                t,
                c.rb(),
            );
            let (w, _) = carve::<T>(stack, need.m, need.n);
            larfb_work(
                Side::Left,
                Op::ConjugateTranspose,
                Direction::Forward,
                Storage::Columnwise,
                v,
                t,
                c,
                w,
                params.parallelism,
            )?;
        }
    }

    Ok(())
}

/// Returns the scratch shape needed by [`gelq2`] and [`gerq2`].
pub fn gelq2_worksize<T: ComplexField>(a: MatRef<'_, T>) -> WorkInfo {
    WorkInfo::new(a.nrows(), 1)
}

/// Unblocked LQ factorization of the `m × n` matrix `a`.
///
/// On return, the lower trapezoid of `a` holds `L` and row `i` right of the diagonal holds
/// the conjugated tail of `v_i`, where `Q = H_{k-1}^H ... H_1^H H_0^H`.
///
/// # Errors
///
/// Returns [`LapackError::InvalidArgument`] if `tau.len() != min(m, n)` (position 2) or if
/// `work` is smaller than [`gelq2_worksize`] (position 3).
pub fn gelq2<T: ComplexField>(
    mut a: MatMut<'_, T>,
    tau: &mut [T],
    work: &mut [T],
) -> Result<(), LapackError> {
    const ROUTINE: &str = "gelq2";

    let m = a.nrows();
    let n = a.ncols();
    let k = Ord::min(m, n);
    lapack_check!(tau.len() == k, ROUTINE, 2);
    lapack_check!(work.len() >= gelq2_worksize(a.rb()).size(), ROUTINE, 3);

    for i in 0..k {
        lacgv(a.rb_mut().submatrix(i, i, 1, n - i));
        let alpha = a.read(i, i);
        let (tau_i, beta) = larfg(alpha, a.rb_mut().submatrix(i, i + 1, 1, n - i - 1));
        tau[i] = tau_i;

        if i + 1 < m {
            a.write(i, i, T::one());
            let (top, bottom) = a.rb_mut().split_at_row(i + 1);
            let v = top.rb().submatrix(i, i, 1, n - i).transpose();
            let c = bottom.submatrix(0, i, m - i - 1, n - i);
            let len = larf_worksize(Side::Right, c.rb());
            larf(Side::Right, v, tau_i, c, &mut work[..len]);
        }
        a.write(i, i, beta);
        lacgv(a.rb_mut().submatrix(i, i + 1, 1, n - i - 1));
    }

    Ok(())
}

/// Unblocked RQ factorization of the `m × n` matrix `a`.
///
/// On return, the upper trapezoid ending at the bottom right corner of `a` holds `R`, and row
/// `m - k + i` left of column `n - k + i` holds the conjugated head of `v_i`, where
/// `Q = H_0^H H_1^H ... H_{k-1}^H`.
///
/// # Errors
///
/// Returns [`LapackError::InvalidArgument`] if `tau.len() != min(m, n)` (position 2) or if
/// `work` is smaller than [`gelq2_worksize`] (position 3).
pub fn gerq2<T: ComplexField>(
    mut a: MatMut<'_, T>,
    tau: &mut [T],
    work: &mut [T],
) -> Result<(), LapackError> {
    const ROUTINE: &str = "gerq2";

    let m = a.nrows();
    let n = a.ncols();
    let k = Ord::min(m, n);
    lapack_check!(tau.len() == k, ROUTINE, 2);
    lapack_check!(work.len() >= gelq2_worksize(a.rb()).size(), ROUTINE, 3);

    for i in (0..k).rev() {
        let row = m - k + i;
        let len = n - k + i + 1;

        lacgv(a.rb_mut().submatrix(row, 0, 1, len));
        let alpha = a.read(row, len - 1);
        let (tau_i, beta) = larfg(alpha, a.rb_mut().submatrix(row, 0, 1, len - 1));
        tau[i] = tau_i;

        a.write(row, len - 1, T::one());
        let (top, bottom) = a.rb_mut().split_at_row(row);
        let v = bottom.rb().submatrix(0, 0, 1, len).transpose();
        let c = top.submatrix(0, 0, row, len);
        let work_len = larf_worksize(Side::Right, c.rb());
        larf(Side::Right, v, tau_i, c, &mut work[..work_len]);

        a.write(row, len - 1, beta);
        lacgv(a.rb_mut().submatrix(row, 0, 1, len - 1));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use assert2::assert as fancy_assert;
    use wy_core::{c64, Mat};

    fn upper_part<T: TestScalar>(a: MatRef<'_, T>, shift: isize) -> Mat<T> {
        a.with_access(Access::band(shift, isize::MAX)).to_owned()
    }

    #[test]
    fn qr_reconstructs() {
        for (m, n) in [(7, 4), (4, 7), (5, 5)] {
            let a_init = random_mat::<c64>(m, n);
            let k = Ord::min(m, n);
            let mut a = a_init.clone();
            let mut tau = vec![c64::new(0.0, 0.0); k];
            let mut work = vec![c64::new(0.0, 0.0); geqr2_worksize(a.as_ref()).size()];
            geqr2(a.as_mut(), &mut tau, &mut work).unwrap();

            let reflectors = Mat::from_fn(m, k, |i, j| {
                if i == j {
                    c64::new(1.0, 0.0)
                } else if i > j {
                    a.read(i, j)
                } else {
                    c64::new(0.0, 0.0)
                }
            });
            let q = explicit_block(&reflectors, &tau, Direction::Forward);
            let r = upper_part(a.as_ref(), 0);
            let qr = q.as_ref() * r.as_ref();
            assert_mat_close(qr.as_ref(), a_init.as_ref(), 1e-12);
        }
    }

    #[test]
    fn blocked_qr_matches_unblocked() {
        let (m, n) = (11, 7);
        let a_init = random_mat::<c64>(m, n);

        let mut a = a_init.clone();
        let mut tau = vec![c64::new(0.0, 0.0); n];
        let mut work = vec![c64::new(0.0, 0.0); n];
        geqr2(a.as_mut(), &mut tau, &mut work).unwrap();

        for nb in [1, 3, 7, 64] {
            let mut a_blocked = a_init.clone();
            let mut tau_blocked = vec![c64::new(0.0, 0.0); n];
            geqrf(
                a_blocked.as_mut(),
                &mut tau_blocked,
                GeqrfParams::default().with_blocksize(nb),
            )
            .unwrap();
            assert_mat_close(a_blocked.as_ref(), a.as_ref(), 1e-12);
            for (x, y) in tau.iter().zip(&tau_blocked) {
                fancy_assert!((x - y).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn lq_reconstructs() {
        for (m, n) in [(4, 7), (6, 6), (7, 3)] {
            let a_init = random_mat::<c64>(m, n);
            let k = Ord::min(m, n);
            let mut a = a_init.clone();
            let mut tau = vec![c64::new(0.0, 0.0); k];
            let mut work = vec![c64::new(0.0, 0.0); gelq2_worksize(a.as_ref()).size()];
            gelq2(a.as_mut(), &mut tau, &mut work).unwrap();

            // v_i = [0.., 1, conj(a[i, i+1..])]
            let reflectors = Mat::from_fn(n, k, |i, j| {
                if i == j {
                    c64::new(1.0, 0.0)
                } else if i > j {
                    a.read(j, i).conj()
                } else {
                    c64::new(0.0, 0.0)
                }
            });
            let h = explicit_block(&reflectors, &tau, Direction::Forward);
            let q = conj_transpose(h.as_ref());
            let l = a
                .as_ref()
                .submatrix(0, 0, m, k)
                .with_access(Access::lower())
                .to_owned();
            let lq = l.as_ref() * q.as_ref().submatrix(0, 0, k, n);
            assert_mat_close(lq.as_ref(), a_init.as_ref(), 1e-12);
        }
    }

    #[test]
    fn rq_reconstructs() {
        for (m, n) in [(4, 7), (6, 6), (7, 3)] {
            let a_init = random_mat::<c64>(m, n);
            let k = Ord::min(m, n);
            let mut a = a_init.clone();
            let mut tau = vec![c64::new(0.0, 0.0); k];
            let mut work = vec![c64::new(0.0, 0.0); gelq2_worksize(a.as_ref()).size()];
            gerq2(a.as_mut(), &mut tau, &mut work).unwrap();

            // v_i = [conj(a[m-k+i, ..n-k+i]), 1, 0..]
            let reflectors = Mat::from_fn(n, k, |i, j| {
                let unit = n - k + j;
                if i == unit {
                    c64::new(1.0, 0.0)
                } else if i < unit {
                    a.read(m - k + j, i).conj()
                } else {
                    c64::new(0.0, 0.0)
                }
            });
            let h = explicit_block(&reflectors, &tau, Direction::Backward);
            let q = conj_transpose(h.as_ref());
            // R ends at the bottom right corner, its leading columns are zero when m < n
            let r = upper_part(a.as_ref(), n as isize - m as isize);
            let rq = r.as_ref() * q.as_ref();
            assert_mat_close(rq.as_ref(), a_init.as_ref(), 1e-12);
        }
    }

    #[test]
    fn rejects_short_tau() {
        let mut a = Mat::<f64>::zeros(4, 3);
        let mut work = vec![0.0; 4];
        let err = geqr2(a.as_mut(), &mut [0.0; 2], &mut work).unwrap_err();
        fancy_assert!(err.position() == 2);
        let err = gelq2(a.as_mut(), &mut [0.0; 3], &mut work[..2]).unwrap_err();
        fancy_assert!(err.position() == 3);
    }
}
