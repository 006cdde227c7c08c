//! Application of a compact-WY block reflector.
//!
//! A block of `k` reflectors is applied as `H = I - V T V^H`, where `V` stacks the reflector
//! vectors (with an implicit unit triangle) and `T` is the triangular factor built by
//! [`larft`](crate::householder::larft). The eight storage/direction/side combinations all
//! follow the same five steps; they only differ in which block of `V` and `C` is the
//! triangular one, which triangles are referenced and whether `V` enters a product plain or
//! conjugate transposed. [`Plan`] holds those choices.

use reborrow::*;
use wy_core::{
    lapack_check,
    matrix_ops::{add_assign, lacpy},
    mul::{
        gemm,
        triangular::{trmm, BlockStructure},
    },
    workspace::{acquire, carve, WorkInfo},
    Access, ComplexField, Direction, LapackError, MatMut, MatRef, Op, Parallelism, Side, Storage,
    Uplo,
};

const ROUTINE: &str = "larfb";

/// Which blocks of `V` and `C` play which role for a given `(side, direction, storev)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Plan {
    /// Offset (rows of `C` for the left side, columns for the right side, and the matching
    /// rows or columns of `V`) where `V` is split.
    split: usize,
    /// Whether the triangular block comes before the split.
    tri_first: bool,
    /// Structure of the triangular block of `V`, as stored.
    v_tri: BlockStructure,
    /// Structure of `T`.
    t: BlockStructure,
    /// How `V` enters `W := op(V) C` (left) or `W := C op(V)` (right). The products that
    /// propagate `W` back into `C` use the opposite form.
    acc_op: Op,
    /// Region of `V` that is read.
    v_region: Access,
}

impl Plan {
    fn new(side: Side, direction: Direction, storev: Storage, n_a: usize, k: usize) -> Self {
        let (split, tri_first) = match direction {
            Direction::Forward => (k, true),
            Direction::Backward => (n_a - k, false),
        };
        let v_tri = match (direction, storev) {
            (Direction::Forward, Storage::Columnwise) | (Direction::Backward, Storage::Rowwise) => {
                BlockStructure::UnitTriangularLower
            }
            (Direction::Forward, Storage::Rowwise) | (Direction::Backward, Storage::Columnwise) => {
                BlockStructure::UnitTriangularUpper
            }
        };
        let t = match direction {
            Direction::Forward => BlockStructure::TriangularUpper,
            Direction::Backward => BlockStructure::TriangularLower,
        };
        let acc_op = if (side == Side::Left) == (storev == Storage::Columnwise) {
            Op::ConjugateTranspose
        } else {
            Op::NoTranspose
        };

        // the unit triangle sits `n_a - k` rows (columnwise) or columns (rowwise) into `V` for
        // the backward direction, which shifts the band of diagonals that is read
        let offset = if tri_first { 0 } else { (n_a - k) as isize };
        let shift = match storev {
            Storage::Columnwise => -offset,
            Storage::Rowwise => offset,
        };
        let v_region = if v_tri.is_lower() {
            Access::band(isize::MIN, shift - 1)
        } else {
            Access::band(shift + 1, isize::MAX)
        };

        Self {
            split,
            tri_first,
            v_tri,
            t,
            acc_op,
            v_region,
        }
    }

    fn prop_op(&self) -> Op {
        match self.acc_op {
            Op::NoTranspose => Op::ConjugateTranspose,
            _ => Op::NoTranspose,
        }
    }
}

fn order(side: Side, m: usize, n: usize) -> usize {
    match side {
        Side::Left => m,
        Side::Right => n,
    }
}

/// Returns the shape of the scratch matrix `W` needed by [`larfb`]: `k × n` for the left side
/// and `m × k` for the right side, where `C` is `m × n` and `k` is the order of `T`.
pub fn larfb_worksize<T: ComplexField>(
    side: Side,
    _trans: Op,
    _direction: Direction,
    _storev: Storage,
    _v: MatRef<'_, T>,
    t: MatRef<'_, T>,
    c: MatRef<'_, T>,
) -> WorkInfo {
    let k = t.nrows();
    match side {
        Side::Left => WorkInfo::new(k, c.ncols()),
        Side::Right => WorkInfo::new(c.nrows(), k),
    }
}

/// Applies the block reflector `H = I - V T V^H`, or its transpose or conjugate transpose, to
/// `c` from the left or from the right:
/// - `c := op(H) c` if `side` is [`Side::Left`],
/// - `c := c op(H)` if `side` is [`Side::Right`].
///
/// `V` holds `k` reflectors of order `n_a` (`m` for the left side, `n` for the right side),
/// as the columns of an `n_a × k` matrix or the rows of a `k × n_a` matrix depending on
/// `storev`. Its unit triangle (and the zeros beyond it) is implicit and is never read; `v` may
/// be restricted to the part that holds the reflectors with [`MatRef::with_access`]. `t` is
/// the `k × k` triangular factor, upper for [`Direction::Forward`] and lower for
/// [`Direction::Backward`]; only that triangle is read.
///
/// Scratch memory is taken from `work` if it holds at least [`larfb_worksize`] elements, and
/// allocated otherwise.
///
/// # Errors
///
/// Returns [`LapackError::InvalidArgument`] without modifying `c` if:
/// - `trans` is [`Op::Transpose`] and `T` is complex (position 2),
/// - `v` has the wrong shape or its access policy does not cover the reflectors (position 5),
/// - `t` is not square or does not allow reading its triangle (position 6),
/// - `c` does not allow writing every element, or `k > n_a` (position 7).
pub fn larfb<T: ComplexField>(
    side: Side,
    trans: Op,
    direction: Direction,
    storev: Storage,
    v: MatRef<'_, T>,
    t: MatRef<'_, T>,
    c: MatMut<'_, T>,
    work: Option<&mut [T]>,
    parallelism: Parallelism,
) -> Result<(), LapackError> {
    lapack_check!(!(T::IS_COMPLEX && trans == Op::Transpose), ROUTINE, 2);
    if c.nrows() == 0 || c.ncols() == 0 || t.nrows() == 0 {
        return Ok(());
    }
    check_args(side, direction, storev, v, t, c.rb())?;

    let info = larfb_worksize(side, trans, direction, storev, v, t, c.rb());
    let mut mem = None;
    let (stack, _) = acquire::<T>(info, work, &mut mem);
    let (w, _) = carve::<T>(stack, info.m, info.n);
    larfb_work(side, trans, direction, storev, v, t, c, w, parallelism)
}

/// Same as [`larfb`], with a caller-provided scratch matrix `w` of at least the shape
/// returned by [`larfb_worksize`]. Only its leading block of that shape is used.
///
/// # Errors
///
/// Same as [`larfb`], and additionally position 8 if `w` is too small or not writable.
pub fn larfb_work<T: ComplexField>(
    side: Side,
    trans: Op,
    direction: Direction,
    storev: Storage,
    v: MatRef<'_, T>,
    t: MatRef<'_, T>,
    c: MatMut<'_, T>,
    w: MatMut<'_, T>,
    parallelism: Parallelism,
) -> Result<(), LapackError> {
    lapack_check!(!(T::IS_COMPLEX && trans == Op::Transpose), ROUTINE, 2);
    if c.nrows() == 0 || c.ncols() == 0 || t.nrows() == 0 {
        return Ok(());
    }
    check_args(side, direction, storev, v, t, c.rb())?;

    let need = larfb_worksize(side, trans, direction, storev, v, t, c.rb());
    lapack_check!(
        w.nrows() >= need.m
            && w.ncols() >= need.n
            && w.access().is_dense_for(need.m, need.n),
        ROUTINE,
        8
    );

    let n_a = order(side, c.nrows(), c.ncols());
    let k = t.nrows();
    let plan = Plan::new(side, direction, storev, n_a, k);
    let w = w.submatrix(0, 0, need.m, need.n);
    apply(plan, side, trans, storev, v, t, c, w, parallelism);
    Ok(())
}

fn check_args<T: ComplexField>(
    side: Side,
    direction: Direction,
    storev: Storage,
    v: MatRef<'_, T>,
    t: MatRef<'_, T>,
    c: MatRef<'_, T>,
) -> Result<(), LapackError> {
    let k = t.nrows();
    let n_a = order(side, c.nrows(), c.ncols());

    let (v_nrows, v_ncols) = match storev {
        Storage::Columnwise => (n_a, k),
        Storage::Rowwise => (k, n_a),
    };
    lapack_check!(v.nrows() == v_nrows && v.ncols() == v_ncols, ROUTINE, 5);
    lapack_check!(t.ncols() == k, ROUTINE, 6);
    lapack_check!(k <= n_a, ROUTINE, 7);

    let plan = Plan::new(side, direction, storev, n_a, k);
    lapack_check!(
        v.access().covers(plan.v_region, v.nrows(), v.ncols()),
        ROUTINE,
        5
    );
    lapack_check!(t.access().covers(plan.t.region(), k, k), ROUTINE, 6);
    lapack_check!(c.access().is_dense_for(c.nrows(), c.ncols()), ROUTINE, 7);
    Ok(())
}

fn apply<T: ComplexField>(
    plan: Plan,
    side: Side,
    trans: Op,
    storev: Storage,
    v: MatRef<'_, T>,
    t: MatRef<'_, T>,
    c: MatMut<'_, T>,
    mut w: MatMut<'_, T>,
    parallelism: Parallelism,
) {
    let one = T::one();
    let acc_op = plan.acc_op;
    let prop_op = plan.prop_op();

    let (v_first, v_second) = match storev {
        Storage::Columnwise => v.split_at_row(plan.split),
        Storage::Rowwise => v.split_at_col(plan.split),
    };
    let (c_first, c_second) = match side {
        Side::Left => c.split_at_row(plan.split),
        Side::Right => c.split_at_col(plan.split),
    };
    let (v_tri, v_rect, mut c_tri, mut c_rect) = if plan.tri_first {
        (v_first, v_second, c_first, c_second)
    } else {
        (v_second, v_first, c_second, c_first)
    };
    let has_rect = match side {
        Side::Left => c_rect.nrows() > 0,
        Side::Right => c_rect.ncols() > 0,
    };

    // W := C_tri
    lacpy(Uplo::General, c_tri.rb(), w.rb_mut());

    // W := op(V_tri) W, or W op(V_tri)
    trmm(side, plan.v_tri, acc_op, one, v_tri, w.rb_mut(), parallelism);

    // W += op(V_rect) C_rect, or C_rect op(V_rect)
    if has_rect {
        match side {
            Side::Left => gemm(
                acc_op,
                Op::NoTranspose,
                one,
                v_rect,
                c_rect.rb(),
                one,
                w.rb_mut(),
                parallelism,
            ),
            Side::Right => gemm(
                Op::NoTranspose,
                acc_op,
                one,
                c_rect.rb(),
                v_rect,
                one,
                w.rb_mut(),
                parallelism,
            ),
        }
    }

    // W := op(T) W, or W op(T)
    trmm(side, plan.t, trans, one, t, w.rb_mut(), parallelism);

    // C_rect -= op'(V_rect) W, or W op'(V_rect)
    if has_rect {
        match side {
            Side::Left => gemm(
                prop_op,
                Op::NoTranspose,
                -one,
                v_rect,
                w.rb(),
                one,
                c_rect.rb_mut(),
                parallelism,
            ),
            Side::Right => gemm(
                Op::NoTranspose,
                prop_op,
                -one,
                w.rb(),
                v_rect,
                one,
                c_rect.rb_mut(),
                parallelism,
            ),
        }
    }

    // W := -op'(V_tri) W, or -W op'(V_tri)
    trmm(side, plan.v_tri, prop_op, -one, v_tri, w.rb_mut(), parallelism);

    // C_tri += W
    add_assign(c_tri.rb_mut(), w.rb());
}
