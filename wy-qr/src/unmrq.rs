//! Application of the unitary factor of an RQ factorization.

use crate::{
    householder::larft,
    larfb::{larfb_work, larfb_worksize},
};
use reborrow::*;
use wy_core::{
    lapack_check,
    workspace::{acquire, carve, UnmrqParams, WorkInfo},
    Access, ComplexField, Direction, LapackError, MatMut, MatRef, Op, Side, Storage,
};

const ROUTINE: &str = "unmrq";

/// Returns the scratch shape needed by [`unmrq`].
pub fn unmrq_worksize<T: ComplexField>(
    side: Side,
    _trans: Op,
    _a: MatRef<'_, T>,
    tau: &[T],
    c: MatRef<'_, T>,
    params: &UnmrqParams<'_, T>,
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

/// Overwrites `c` with `Q c`, `Q^H c`, `c Q` or `c Q^H`, where `Q = H_0^H H_1^H ... H_{k-1}^H`
/// is the unitary factor of an RQ factorization, as left by [`gerq2`](crate::factor::gerq2).
///
/// `a` is `k × nA`, where `nA` is `m` for the left side and `n` for the right side and `c` is
/// `m × n`; it holds the last `k` rows of the factored matrix. Reflector `i` has its implicit
/// unit element at column `nA - k + i` of row `i`, and its other elements to the left of it.
/// [`Op::Transpose`] is accepted for real types and means the same as
/// [`Op::ConjugateTranspose`].
///
/// # Errors
///
/// Returns [`LapackError::InvalidArgument`] without modifying `c` if:
/// - `trans` is [`Op::Transpose`] and `T` is complex (position 2),
/// - `a` has the wrong shape or does not allow reading the reflectors (position 3),
/// - `k` is larger than the order of `Q` (position 4),
/// - `c` does not allow writing every element (position 5),
/// - the block size is zero (position 6).
pub fn unmrq<T: ComplexField>(
    side: Side,
    trans: Op,
    a: MatRef<'_, T>,
    tau: &[T],
    mut c: MatMut<'_, T>,
    params: UnmrqParams<'_, T>,
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
    lapack_check!(k <= n_a, ROUTINE, 4);
    lapack_check!(a.nrows() == k && a.ncols() == n_a, ROUTINE, 3);
    let region = Access::band(isize::MIN, (n_a - k) as isize - 1);
    lapack_check!(a.access().covers(region, k, n_a), ROUTINE, 3);
    lapack_check!(c.access().is_dense_for(m, n), ROUTINE, 5);
    lapack_check!(params.blocksize >= 1, ROUTINE, 6);
    if m == 0 || n == 0 || k == 0 {
        return Ok(());
    }

    let info = unmrq_worksize(side, trans, a, tau, c.rb(), &params);
    let nb = Ord::min(params.blocksize, k);
    log::debug!(
        "unmrq: {side:?} {trans:?} m={m} n={n} k={k} nb={nb}, work {}×{}",
        info.m,
        info.n,
    );

    let mut mem = None;
    let (mut stack, _) = acquire::<T>(info, params.work, &mut mem);

    // Q^H c and c Q apply H_0 (resp. H_0^H) first
    let ascending = match (side, trans) {
        (Side::Left, Op::NoTranspose) => false,
        (Side::Right, Op::NoTranspose) => true,
        (Side::Left, _) => true,
        (Side::Right, _) => false,
    };
    let larfb_trans = trans.flipped();
    let a = a.with_access(region);

    let nblocks = (k + nb - 1) / nb;
    for step in 0..nblocks {
        let block = if ascending { step } else { nblocks - 1 - step };
        let i = block * nb;
        let ib = Ord::min(nb, k - i);
        // reflectors i..i+ib act on the first `len` rows (left) or columns (right) of c
        let len = n_a - k + i + ib;
        log::trace!("unmrq: block {i}..{}, order {len}", i + ib);

        let v = a.submatrix(i, 0, ib, len);
        let (mut t, stack) = carve::<T>(stack.rb_mut(), ib, ib);
        larft(
            Direction::Backward,
            Storage::Rowwise,
            v,
            &tau[i..i + ib],
            t.rb_mut(),
        )?;
        let t = t.into_const().with_access(Access::lower());

        let ci = match side {
            Side::Left => c.rb_mut().submatrix(0, 0, len, n),
            Side::Right => c.rb_mut().submatrix(0, 0, m, len),
        };
        let need = larfb_worksize(
            side,
            larfb_trans,
            Direction::Backward,
            Storage::Rowwise,
            v,
            t,
            ci.rb(),
        );
        let (w, _) = carve::<T>(stack, need.m, need.n);
        larfb_work(
            side,
            larfb_trans,
            Direction::Backward,
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
