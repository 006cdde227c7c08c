use crate::{c32, c64, ComplexField, Conj, MatMut, MatRef, Op, Parallelism};
use assert2::assert as fancy_assert;
use reborrow::*;

/// Returns the view `op(mat)` is computed from, together with the conjugation to apply to its
/// elements.
#[inline]
pub fn op_view<T>(mat: MatRef<'_, T>, op: Op) -> (MatRef<'_, T>, Conj) {
    match op {
        Op::NoTranspose => (mat, Conj::No),
        Op::Transpose => (mat.transpose(), Conj::No),
        Op::ConjugateTranspose => (mat.transpose(), Conj::Yes),
    }
}

#[inline]
fn gemm_parallelism(parallelism: Parallelism) -> gemm::Parallelism {
    match parallelism {
        Parallelism::None => gemm::Parallelism::None,
        Parallelism::Rayon(0) => gemm::Parallelism::Rayon(rayon::current_num_threads()),
        Parallelism::Rayon(n_threads) => gemm::Parallelism::Rayon(n_threads),
    }
}

/// Computes the matrix product `[alpha * dst] + beta * op(lhs) * op(rhs)` and stores the result
/// in `dst`, where `op` conjugates its operand if the corresponding `Conj` is `Yes`.
///
/// If `alpha` is not provided, the preexisting values in `dst` are not read.
///
/// # Panics
///
/// Panics if the matrix dimensions are not compatible for matrix multiplication.
/// i.e.
///  - `dst.nrows() == lhs.nrows()`
///  - `dst.ncols() == rhs.ncols()`
///  - `lhs.ncols() == rhs.nrows()`
#[track_caller]
#[inline]
pub fn matmul<T: ComplexField>(
    dst: MatMut<'_, T>,
    lhs: MatRef<'_, T>,
    conj_lhs: Conj,
    rhs: MatRef<'_, T>,
    conj_rhs: Conj,
    alpha: Option<T>,
    beta: T,
    parallelism: Parallelism,
) {
    fancy_assert!(dst.nrows() == lhs.nrows());
    fancy_assert!(dst.ncols() == rhs.ncols());
    fancy_assert!(lhs.ncols() == rhs.nrows());
    matmul_impl(dst, lhs, conj_lhs, rhs, conj_rhs, alpha, beta, parallelism);
}

fn matmul_impl<T: ComplexField>(
    mut dst: MatMut<'_, T>,
    lhs: MatRef<'_, T>,
    conj_lhs: Conj,
    rhs: MatRef<'_, T>,
    conj_rhs: Conj,
    alpha: Option<T>,
    beta: T,
    parallelism: Parallelism,
) {
    let m = dst.nrows();
    let n = dst.ncols();
    let k = lhs.ncols();

    if m == 0 || n == 0 {
        return;
    }
    if k == 0 {
        match alpha {
            Some(alpha) => crate::matrix_ops::scal(alpha, dst),
            None => dst.fill(T::zero()),
        }
        return;
    }

    let conj_lhs = conj_lhs == Conj::Yes;
    let conj_rhs = conj_rhs == Conj::Yes;
    let gemm_parallelism = gemm_parallelism(parallelism);

    if coe::is_same::<f32, T>() {
        let alpha: Option<f32> = coe::coerce_static(alpha);
        let beta: f32 = coe::coerce_static(beta);
        unsafe {
            gemm::gemm(
                m,
                n,
                k,
                dst.rb_mut().as_ptr() as *mut f32,
                dst.col_stride(),
                dst.row_stride(),
                alpha.is_some(),
                lhs.as_ptr() as *const f32,
                lhs.col_stride(),
                lhs.row_stride(),
                rhs.as_ptr() as *const f32,
                rhs.col_stride(),
                rhs.row_stride(),
                alpha.unwrap_or(0.0),
                beta,
                false,
                conj_lhs,
                conj_rhs,
                gemm_parallelism,
            )
        };
        return;
    }
    if coe::is_same::<f64, T>() {
        let alpha: Option<f64> = coe::coerce_static(alpha);
        let beta: f64 = coe::coerce_static(beta);
        unsafe {
            gemm::gemm(
                m,
                n,
                k,
                dst.rb_mut().as_ptr() as *mut f64,
                dst.col_stride(),
                dst.row_stride(),
                alpha.is_some(),
                lhs.as_ptr() as *const f64,
                lhs.col_stride(),
                lhs.row_stride(),
                rhs.as_ptr() as *const f64,
                rhs.col_stride(),
                rhs.row_stride(),
                alpha.unwrap_or(0.0),
                beta,
                false,
                conj_lhs,
                conj_rhs,
                gemm_parallelism,
            )
        };
        return;
    }
    if coe::is_same::<c32, T>() {
        let alpha: Option<c32> = coe::coerce_static(alpha);
        let beta: c32 = coe::coerce_static(beta);
        let alpha_ = alpha.unwrap_or(c32::new(0.0, 0.0));
        unsafe {
            gemm::gemm(
                m,
                n,
                k,
                dst.rb_mut().as_ptr() as *mut gemm::c32,
                dst.col_stride(),
                dst.row_stride(),
                alpha.is_some(),
                lhs.as_ptr() as *const gemm::c32,
                lhs.col_stride(),
                lhs.row_stride(),
                rhs.as_ptr() as *const gemm::c32,
                rhs.col_stride(),
                rhs.row_stride(),
                gemm::c32 {
                    re: alpha_.re,
                    im: alpha_.im,
                },
                gemm::c32 {
                    re: beta.re,
                    im: beta.im,
                },
                false,
                conj_lhs,
                conj_rhs,
                gemm_parallelism,
            )
        };
        return;
    }
    if coe::is_same::<c64, T>() {
        let alpha: Option<c64> = coe::coerce_static(alpha);
        let beta: c64 = coe::coerce_static(beta);
        let alpha_ = alpha.unwrap_or(c64::new(0.0, 0.0));
        unsafe {
            gemm::gemm(
                m,
                n,
                k,
                dst.rb_mut().as_ptr() as *mut gemm::c64,
                dst.col_stride(),
                dst.row_stride(),
                alpha.is_some(),
                lhs.as_ptr() as *const gemm::c64,
                lhs.col_stride(),
                lhs.row_stride(),
                rhs.as_ptr() as *const gemm::c64,
                rhs.col_stride(),
                rhs.row_stride(),
                gemm::c64 {
                    re: alpha_.re,
                    im: alpha_.im,
                },
                gemm::c64 {
                    re: beta.re,
                    im: beta.im,
                },
                false,
                conj_lhs,
                conj_rhs,
                gemm_parallelism,
            )
        };
        return;
    }

    // scalar types without a gemm backend
    let conj_lhs = if conj_lhs { Conj::Yes } else { Conj::No };
    let conj_rhs = if conj_rhs { Conj::Yes } else { Conj::No };
    for j in 0..n {
        for i in 0..m {
            let mut acc = T::zero();
            for p in 0..k {
                acc = acc + conj_lhs.apply(lhs.read(i, p)) * conj_rhs.apply(rhs.read(p, j));
            }
            let value = match alpha {
                Some(alpha) => alpha * dst.read(i, j) + beta * acc,
                None => beta * acc,
            };
            dst.write(i, j, value);
        }
    }
}

/// BLAS-style product `c := alpha * op_a(a) * op_b(b) + beta * c`.
///
/// `c` is not read when `beta` is zero.
#[track_caller]
pub fn gemm<T: ComplexField>(
    op_a: Op,
    op_b: Op,
    alpha: T,
    a: MatRef<'_, T>,
    b: MatRef<'_, T>,
    beta: T,
    c: MatMut<'_, T>,
    parallelism: Parallelism,
) {
    let (a, conj_a) = op_view(a, op_a);
    let (b, conj_b) = op_view(b, op_b);
    let keep = if beta == T::zero() { None } else { Some(beta) };
    matmul(c, a, conj_a, b, conj_b, keep, alpha, parallelism);
}

/// BLAS-style matrix-vector product `y := alpha * op(a) * x + beta * y`, where `x` and `y` are
/// column vectors.
#[track_caller]
pub fn gemv<T: ComplexField>(
    op: Op,
    alpha: T,
    a: MatRef<'_, T>,
    x: MatRef<'_, T>,
    beta: T,
    y: MatMut<'_, T>,
    parallelism: Parallelism,
) {
    fancy_assert!(x.ncols() == 1);
    fancy_assert!(y.ncols() == 1);
    gemm(op, Op::NoTranspose, alpha, a, x, beta, y, parallelism);
}

pub mod triangular {
    use super::*;
    use crate::{join_raw, parallelism_degree, Access, Side};

    /// Below this many multiply-adds, a product is computed on the calling thread.
    const PARALLEL_THRESHOLD: usize = 48 * 48 * 48;

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub(crate) enum DiagonalKind {
        Zero,
        Unit,
        Generic,
    }

    /// Interpretation of a square matrix operand.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BlockStructure {
        Rectangular,
        TriangularLower,
        StrictTriangularLower,
        UnitTriangularLower,
        TriangularUpper,
        StrictTriangularUpper,
        UnitTriangularUpper,
    }

    impl BlockStructure {
        #[inline]
        pub fn is_dense(self) -> bool {
            matches!(self, BlockStructure::Rectangular)
        }

        #[inline]
        pub fn is_lower(self) -> bool {
            use BlockStructure::*;
            matches!(
                self,
                TriangularLower | StrictTriangularLower | UnitTriangularLower
            )
        }

        #[inline]
        pub fn is_upper(self) -> bool {
            use BlockStructure::*;
            matches!(
                self,
                TriangularUpper | StrictTriangularUpper | UnitTriangularUpper
            )
        }

        #[inline]
        pub fn transpose(self) -> Self {
            use BlockStructure::*;
            match self {
                Rectangular => Rectangular,
                TriangularLower => TriangularUpper,
                StrictTriangularLower => StrictTriangularUpper,
                UnitTriangularLower => UnitTriangularUpper,
                TriangularUpper => TriangularLower,
                StrictTriangularUpper => StrictTriangularLower,
                UnitTriangularUpper => UnitTriangularLower,
            }
        }

        #[inline]
        pub(crate) fn diag_kind(self) -> DiagonalKind {
            use BlockStructure::*;
            match self {
                Rectangular | TriangularLower | TriangularUpper => DiagonalKind::Generic,
                StrictTriangularLower | StrictTriangularUpper => DiagonalKind::Zero,
                UnitTriangularLower | UnitTriangularUpper => DiagonalKind::Unit,
            }
        }

        /// Elements of the operand that are actually read.
        #[inline]
        pub fn region(self) -> Access {
            use BlockStructure::*;
            match self {
                Rectangular => Access::dense(),
                TriangularLower => Access::lower(),
                StrictTriangularLower | UnitTriangularLower => Access::strict_lower(),
                TriangularUpper => Access::upper(),
                StrictTriangularUpper | UnitTriangularUpper => Access::strict_upper(),
            }
        }
    }

    /// Computes `b := alpha * op(a) * b` (left) or `b := alpha * b * op(a)` (right) in place,
    /// where `a` is square and interpreted according to `structure`.
    ///
    /// Only the elements of `a` named by `structure` are read. In particular, the diagonal of a
    /// unit or strict triangular `a` is never read.
    ///
    /// # Panics
    ///
    /// Panics if `structure` is [`BlockStructure::Rectangular`] or if the dimensions do not
    /// match.
    #[track_caller]
    pub fn trmm<T: ComplexField>(
        side: Side,
        structure: BlockStructure,
        op: Op,
        alpha: T,
        a: MatRef<'_, T>,
        b: MatMut<'_, T>,
        parallelism: Parallelism,
    ) {
        fancy_assert!(!structure.is_dense());
        fancy_assert!(a.nrows() == a.ncols());
        match side {
            Side::Left => {
                fancy_assert!(a.ncols() == b.nrows());
            }
            Side::Right => {
                fancy_assert!(a.nrows() == b.ncols());
            }
        }

        let (a, conj) = op_view(a, op);
        let structure = if op.is_transposed() {
            structure.transpose()
        } else {
            structure
        };

        match side {
            Side::Left => trmm_left(structure, a, conj, alpha, b, parallelism),
            // b * a = (a^T * b^T)^T
            Side::Right => trmm_left(
                structure.transpose(),
                a.transpose(),
                conj,
                alpha,
                b.transpose(),
                parallelism,
            ),
        }
    }

    /// Computes `x := op(a) * x` in place for a column vector `x`.
    #[track_caller]
    pub fn trmv<T: ComplexField>(
        structure: BlockStructure,
        op: Op,
        a: MatRef<'_, T>,
        x: MatMut<'_, T>,
    ) {
        fancy_assert!(x.ncols() == 1);
        trmm(Side::Left, structure, op, T::one(), a, x, Parallelism::None);
    }

    /// Below this order, triangular products are computed directly.
    const TRMM_BLOCK: usize = 16;

    fn trmm_left<T: ComplexField>(
        structure: BlockStructure,
        a: MatRef<'_, T>,
        conj: Conj,
        alpha: T,
        b: MatMut<'_, T>,
        parallelism: Parallelism,
    ) {
        let n = a.nrows();
        if n == 0 || b.ncols() == 0 {
            return;
        }

        // columns of b are independent
        let work = n * n * b.ncols();
        if b.ncols() > 1 && parallelism_degree(parallelism) > 1 && work > PARALLEL_THRESHOLD {
            let mid = b.ncols() / 2;
            let (b_left, b_right) = b.split_at_col(mid);
            join_raw(
                |parallelism| trmm_left(structure, a, conj, alpha, b_left, parallelism),
                |parallelism| trmm_left(structure, a, conj, alpha, b_right, parallelism),
                parallelism,
            );
            return;
        }

        if n <= TRMM_BLOCK {
            trmm_left_unblocked(structure, a, conj, alpha, b);
            return;
        }

        let mid = n / 2;
        let (a_top_left, a_top_right, a_bot_left, a_bot_right) = a.split_at(mid, mid);
        let (mut b_top, mut b_bot) = b.split_at_row(mid);

        if structure.is_upper() {
            // b_top reads the old b_bot
            trmm_left(structure, a_top_left, conj, alpha, b_top.rb_mut(), parallelism);
            matmul(
                b_top.rb_mut(),
                a_top_right,
                conj,
                b_bot.rb(),
                Conj::No,
                Some(T::one()),
                alpha,
                parallelism,
            );
            trmm_left(structure, a_bot_right, conj, alpha, b_bot, parallelism);
        } else {
            // b_bot reads the old b_top
            trmm_left(structure, a_bot_right, conj, alpha, b_bot.rb_mut(), parallelism);
            matmul(
                b_bot.rb_mut(),
                a_bot_left,
                conj,
                b_top.rb(),
                Conj::No,
                Some(T::one()),
                alpha,
                parallelism,
            );
            trmm_left(structure, a_top_left, conj, alpha, b_top, parallelism);
        }
    }

    fn trmm_left_unblocked<T: ComplexField>(
        structure: BlockStructure,
        a: MatRef<'_, T>,
        conj: Conj,
        alpha: T,
        mut b: MatMut<'_, T>,
    ) {
        let n = a.nrows();
        let diag = structure.diag_kind();
        let diag_term = |b: &MatMut<'_, T>, i: usize, j: usize| match diag {
            DiagonalKind::Zero => T::zero(),
            DiagonalKind::Unit => b.read(i, j),
            DiagonalKind::Generic => conj.apply(a.read(i, i)) * b.read(i, j),
        };

        for j in 0..b.ncols() {
            if structure.is_upper() {
                // row i only depends on rows below it, which are still untouched
                for i in 0..n {
                    let mut acc = diag_term(&b, i, j);
                    for l in i + 1..n {
                        acc = acc + conj.apply(a.read(i, l)) * b.read(l, j);
                    }
                    b.write(i, j, alpha * acc);
                }
            } else {
                for i in (0..n).rev() {
                    let mut acc = diag_term(&b, i, j);
                    for l in 0..i {
                        acc = acc + conj.apply(a.read(i, l)) * b.read(l, j);
                    }
                    b.write(i, j, alpha * acc);
                }
            }
        }
    }
}
