//! Blocked generation of the unitary factor of a QR factorization.

use crate::{
    householder::larft,
    larfb::{larfb_work, larfb_worksize},
    ung2r::{ung2r, ung2r_worksize},
};
use reborrow::*;
use wy_core::{
    lapack_check,
    matrix_ops::laset,
    workspace::{acquire, carve, UngqrParams, WorkInfo},
    Access, ComplexField, Direction, LapackError, MatMut, MatRef, Op, Side, Storage, Uplo,
};

const ROUTINE: &str = "ungqr";

/// Returns the scratch shape needed by [`ungqr`].
///
/// The triangular factor of a block (`nb × nb`) is alive while the block reflector is applied
/// to the columns on its right, and the unblocked kernel reuses the same memory afterwards.
pub fn ungqr_worksize<T: ComplexField>(
    a: MatRef<'_, T>,
    tau: &[T],
    params: &UngqrParams<'_, T>,
) -> WorkInfo {
    let m = a.nrows();
    let n = a.ncols();
    let k = tau.len();
    let nb = Ord::min(Ord::max(params.blocksize, 1), k);
    // shapes rejected by `ungqr` need nothing
    if nb == 0 || n == 0 || k > n || n > m {
        return WorkInfo::EMPTY;
    }

    let mut info = WorkInfo::EMPTY;
    if nb < n {
        info += WorkInfo::new(nb, nb);
        // W of the first block, which has the most columns on its right
        info += WorkInfo::new(nb, n - nb);
    }
    info.min_max(ung2r_worksize(a.submatrix(0, 0, m, nb)))
}

/// Overwrites the `m × n` matrix `a` with the first `n` columns of the unitary matrix
/// `Q = H_0 H_1 ... H_{k-1}`, where the `k = tau.len()` reflectors are stored below the
/// diagonal of the first `k` columns of `a` and their factors in `tau`, as left by the QR
/// factorization.
///
/// Reflectors are processed in blocks of `params.blocksize`, starting from the last block.
/// Scratch memory is taken from `params.work` if it holds at least [`ungqr_worksize`]
/// elements, and allocated otherwise.
///
/// # Errors
///
/// Returns [`LapackError::InvalidArgument`] without modifying `a` if:
/// - `n > m`, or `a` does not allow writing every element (position 1, the matrix argument),
/// - `k > n` (position 2),
/// - the block size is zero (position 3).
pub fn ungqr<T: ComplexField>(
    mut a: MatMut<'_, T>,
    tau: &[T],
    params: UngqrParams<'_, T>,
) -> Result<(), LapackError> {
    let m = a.nrows();
    let n = a.ncols();
    let k = tau.len();
    lapack_check!(n <= m, ROUTINE, 1);
    lapack_check!(k <= n, ROUTINE, 2);
    lapack_check!(a.access().is_dense_for(m, n), ROUTINE, 1);
    lapack_check!(params.blocksize >= 1, ROUTINE, 3);
    if n == 0 {
        return Ok(());
    }

    let info = ungqr_worksize(a.rb(), tau, &params);
    let nb = Ord::min(params.blocksize, k);
    log::debug!("ungqr: m={m} n={n} k={k} nb={nb}, work {}×{}", info.m, info.n);

    let mut mem = None;
    let (mut stack, _) = acquire::<T>(info, params.work, &mut mem);

    let zero = T::zero();
    let one = T::one();

    // columns k..n start as columns of the identity
    laset(Uplo::General, zero, zero, a.rb_mut().submatrix(0, k, k, n - k));
    laset(Uplo::General, zero, one, a.rb_mut().submatrix(k, k, m - k, n - k));

    if k == 0 {
        return Ok(());
    }

    for i in (0..k).step_by(nb).rev() {
        let ib = Ord::min(nb, k - i);
        log::trace!("ungqr: block {i}..{}", i + ib);

        if i + ib < n {
            let (left, right) = a.rb_mut().split_at_col(i + ib);
            let v = left
                .rb()
                .submatrix(i, i, m - i, ib)
                .with_access(Access::strict_lower());

            let (mut t, stack) = carve::<T>(stack.rb_mut(), ib, ib);
            larft(
                Direction::Forward,
                Storage::Columnwise,
                v,
                &tau[i..i + ib],
                t.rb_mut(),
            )?;

            let c = right.submatrix(i, 0, m - i, n - i - ib);
            let t = t.into_const().with_access(Access::upper());
            let need = larfb_worksize(
                Side::Left,
                Op::NoTranspose,
                Direction::Forward,
                Storage::Columnwise,
                v,
                t,
                c.rb(),
            );
            let (w, _) = carve::<T>(stack, need.m, need.n);
            larfb_work(
                Side::Left,
                Op::NoTranspose,
                Direction::Forward,
                Storage::Columnwise,
                v,
                t,
                c,
                w,
                params.parallelism,
            )?;
        }

        let mut block = a.rb_mut().submatrix(0, i, m, ib);
        let (work, _) = stack.rb_mut().make_raw::<T>(ib);
        ung2r(block.rb_mut().subrows(i, m - i), &tau[i..i + ib], work)?;
        laset(Uplo::General, zero, zero, block.submatrix(0, 0, i, ib));
    }

    Ok(())
}
