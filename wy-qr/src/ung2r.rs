use crate::householder::{larf, larf_worksize};
use reborrow::*;
use wy_core::{
    lapack_check,
    matrix_ops::{laset, scal},
    workspace::WorkInfo,
    ComplexField, LapackError, MatMut, MatRef, Side, Uplo,
};

/// Returns the scratch shape needed by [`ung2r`] for an `m × n` matrix.
pub fn ung2r_worksize<T: ComplexField>(a: MatRef<'_, T>) -> WorkInfo {
    WorkInfo::new(a.ncols(), 1)
}

/// Overwrites the `m × n` matrix `a` with the first `n` columns of `Q = H_0 H_1 ... H_{k-1}`,
/// where the `k = tau.len()` reflectors are stored below the diagonal of the first `k` columns
/// of `a`, as returned by the QR factorization.
///
/// This is the unblocked algorithm. `work` must hold at least [`ung2r_worksize`] elements.
///
/// # Errors
///
/// Returns [`LapackError::InvalidArgument`] if `n > m` (position 1), `k > n` (position 2), or
/// `work` is shorter than [`ung2r_worksize`] (position 3).
pub fn ung2r<T: ComplexField>(
    mut a: MatMut<'_, T>,
    tau: &[T],
    work: &mut [T],
) -> Result<(), LapackError> {
    const ROUTINE: &str = "ung2r";

    let m = a.nrows();
    let n = a.ncols();
    let k = tau.len();
    lapack_check!(n <= m, ROUTINE, 1);
    lapack_check!(k <= n, ROUTINE, 2);
    lapack_check!(work.len() >= ung2r_worksize(a.rb()).size(), ROUTINE, 3);
    if n == 0 {
        return Ok(());
    }

    let zero = T::zero();
    let one = T::one();

    // columns k..n start as columns of the identity
    laset(Uplo::General, zero, zero, a.rb_mut().submatrix(0, k, k, n - k));
    laset(Uplo::General, zero, one, a.rb_mut().submatrix(k, k, m - k, n - k));

    for i in (0..k).rev() {
        let tau_i = tau[i];

        // apply H_i to a[i.., i+1..] from the left
        if i + 1 < n {
            a.write(i, i, one);
            let (left, right) = a.rb_mut().split_at_col(i + 1);
            let v = left.rb().submatrix(i, i, m - i, 1);
            let c = right.submatrix(i, 0, m - i, n - i - 1);
            let len = larf_worksize(Side::Left, c.rb());
            larf(Side::Left, v, tau_i, c, &mut work[..len]);
        }
        if i + 1 < m {
            scal(-tau_i, a.rb_mut().submatrix(i + 1, i, m - i - 1, 1));
        }
        a.write(i, i, one - tau_i);

        laset(Uplo::General, zero, zero, a.rb_mut().submatrix(0, i, i, 1));
    }

    Ok(())
}
