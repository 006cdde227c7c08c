//! Application of the unitary factor of an LQ factorization.

use crate::{
    householder::larft,
    larfb::{larfb_work, larfb_worksize},
};
use reborrow::*;
use wy_core::{
    lapack_check,
    workspace::{acquire, carve, UnmlqParams, WorkInfo},
    Access, ComplexField, Direction, LapackError, MatMut, MatRef, Op, Side, Storage,
};

const ROUTINE: &str = "unmlq";

/// Returns the scratch shape needed by [`unmlq`].
pub fn unmlq_worksize<T: ComplexField>(
    side: Side,
    _trans: Op,
    _a: MatRef<'_, T>,
    tau: &[T],
    c: MatRef<'_, T>,
    params: &UnmlqParams<'_, T>,
) -> WorkInfo {
    let k = tau.len();
    let nb = Ord::min(Ord::max(params.blocksize, 1), k);
    if nb == 0 || c.nrows() == 0 || c.ncols() == 0 {
        return WorkInfo::EMPTY;
    }
    let w = match side {
        Side::Left => WorkInfo::new(nb, c.ncols()),
        Side::Right => WorkInfo::new(c.nrows(), nb),
    };
    WorkInfo::new(nb, nb) + w
}

/// Overwrites `c` with `Q c`, `Q^H c`, `c Q` or `c Q^H`, where `Q = H_{k-1}^H ... H_1^H H_0^H`
/// is the unitary factor of an LQ factorization, as left by
/// [`gelq2`](crate::factor::gelq2).
///
/// The `k = tau.len()` reflectors are read from the first `k` rows of `a`, right of the
/// diagonal. `a` has `m` columns for the left side and `n` columns for the right side, where
/// `c` is `m × n`. [`Op::Transpose`] is accepted for real types and means the same as
/// [`Op::ConjugateTranspose`].
///
/// # Errors
///
/// Returns [`LapackError::InvalidArgument`] without modifying `c` if:
/// - `trans` is [`Op::Transpose`] and `T` is complex (position 2),
/// - `a` has the wrong number of columns or does not allow reading the reflectors
///   (position 3),
/// - `k` is larger than the number of rows of `a` or than the order of `Q` (position 4),
/// - `c` does not allow writing every element (position 5),
/// - the block size is zero (position 6).
pub fn unmlq<T: ComplexField>(
    side: Side,
    trans: Op,
    a: MatRef<'_, T>,
    tau: &[T],
    mut c: MatMut<'_, T>,
    params: UnmlqParams<'_, T>,
) -> Result<(), LapackError> {
    lapack_check!(!(T::IS_COMPLEX && trans == Op::Transpose), ROUTINE, 2);
    let trans = match trans {
        Op::NoTranspose => Op::NoTranspose,
        _ => Op::ConjugateTranspose,
    };

    let m = c.nrows();
    let n = c.ncols();
    let k = tau.len();
    let n_a = match side {
        Side::Left => m,
        Side::Right => n,
    };
    lapack_check!(a.ncols() == n_a, ROUTINE, 3);
    lapack_check!(k <= a.nrows() && k <= n_a, ROUTINE, 4);
    lapack_check!(
        a.access().covers(Access::strict_upper(), k, n_a),
        ROUTINE,
        3
    );
    lapack_check!(c.access().is_dense_for(m, n), ROUTINE, 5);
    lapack_check!(params.blocksize >= 1, ROUTINE, 6);
    if m == 0 || n == 0 || k == 0 {
        return Ok(());
    }

    let info = unmlq_worksize(side, trans, a, tau, c.rb(), &params);
    let nb = Ord::min(params.blocksize, k);
    log::debug!(
        "unmlq: {side:?} {trans:?} m={m} n={n} k={k} nb={nb}, work {}×{}",
        info.m,
        info.n,
    );

    let mut mem = None;
    let (mut stack, _) = acquire::<T>(info, params.work, &mut mem);

    // Q c and c Q^H apply H_0^H (resp. H_0) first
    let ascending = match (side, trans) {
        (Side::Left, Op::NoTranspose) => true,
        (Side::Right, Op::NoTranspose) => false,
        (Side::Left, _) => false,
        (Side::Right, _) => true,
    };
    let larfb_trans = trans.flipped();
    let a = a.with_access(Access::strict_upper());

    let nblocks = (k + nb - 1) / nb;
    for step in 0..nblocks {
        let block = if ascending { step } else { nblocks - 1 - step };
        let i = block * nb;
        let ib = Ord::min(nb, k - i);
        log::trace!("unmlq: block {i}..{}", i + ib);

        let v = a.submatrix(i, i, ib, n_a - i);
        let (mut t, stack) = carve::<T>(stack.rb_mut(), ib, ib);
        larft(
            Direction::Forward,
            Storage::Rowwise,
            v,
            &tau[i..i + ib],
            t.rb_mut(),
        )?;
        let t = t.into_const().with_access(Access::upper());

        let ci = match side {
            Side::Left => c.rb_mut().submatrix(i, 0, m - i, n),
            Side::Right => c.rb_mut().submatrix(0, i, m, n - i),
        };
        let need = larfb_worksize(
            side,
            larfb_trans,
            Direction::Forward,
            Storage::Rowwise,
            v,
            t,
            ci.rb(),
        );
        let (w, _) = carve::<T>(stack, need.m, need.n);
        larfb_work(
            side,
            larfb_trans,
            Direction::Forward,
            Storage::Rowwise,
            v,
            t,
            ci,
            w,
            params.parallelism,
        )?;
    }

    Ok(())
}
