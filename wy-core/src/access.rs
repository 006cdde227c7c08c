//! Access policies of matrix views.
//!
//! A policy is a band of diagonals: the element at `(i, j)` may be touched iff
//! `lo <= j - i <= hi`. Triangular storage (reflector blocks with an implicit unit
//! diagonal, triangular factors whose other half holds unrelated data) is expressed by
//! restricting a view to such a band, so that kernels can check up front that they only
//! need the part of the matrix that holds meaningful values.

/// Band of diagonals `[lo, hi]` a matrix view is allowed to touch.
///
/// Diagonal `d` is the set of elements `(i, j)` with `j - i == d`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Access {
    lo: isize,
    hi: isize,
}

impl Default for Access {
    #[inline]
    fn default() -> Self {
        Self::dense()
    }
}

impl Access {
    /// Every element.
    #[inline]
    pub const fn dense() -> Self {
        Self::band(isize::MIN, isize::MAX)
    }

    /// Diagonal and above.
    #[inline]
    pub const fn upper() -> Self {
        Self::band(0, isize::MAX)
    }

    /// Strictly above the diagonal.
    #[inline]
    pub const fn strict_upper() -> Self {
        Self::band(1, isize::MAX)
    }

    /// Diagonal and below.
    #[inline]
    pub const fn lower() -> Self {
        Self::band(isize::MIN, 0)
    }

    /// Strictly below the diagonal.
    #[inline]
    pub const fn strict_lower() -> Self {
        Self::band(isize::MIN, -1)
    }

    /// Diagonals `lo..=hi`. An empty band (`lo > hi`) allows nothing.
    #[inline]
    pub const fn band(lo: isize, hi: isize) -> Self {
        Self { lo, hi }
    }

    #[inline]
    pub fn lo(self) -> isize {
        self.lo
    }

    #[inline]
    pub fn hi(self) -> isize {
        self.hi
    }

    /// Returns `true` if the element at `(i, j)` may be touched.
    #[inline]
    pub fn allows(self, i: usize, j: usize) -> bool {
        let d = j as isize - i as isize;
        self.lo <= d && d <= self.hi
    }

    /// Elements allowed by both policies.
    #[inline]
    pub fn intersect(self, other: Self) -> Self {
        Self::band(self.lo.max(other.lo), self.hi.min(other.hi))
    }

    /// Policy seen from a sub-view whose top left corner is at `(i, j)`.
    #[inline]
    pub fn shifted(self, i: usize, j: usize) -> Self {
        let d = j as isize - i as isize;
        Self::band(self.lo.saturating_sub(d), self.hi.saturating_sub(d))
    }

    /// Policy seen from the transposed view.
    #[inline]
    pub fn transposed(self) -> Self {
        Self::band(self.hi.saturating_neg(), self.lo.saturating_neg())
    }

    /// Returns `true` if every element of `region` inside an `nrows × ncols` matrix is
    /// allowed by `self`.
    ///
    /// Only the diagonals that actually exist in the matrix are considered, so an empty
    /// matrix, or a region that misses the matrix entirely, is always covered.
    pub fn covers(self, region: Self, nrows: usize, ncols: usize) -> bool {
        if nrows == 0 || ncols == 0 {
            return true;
        }
        let lo = region.lo.max(1 - nrows as isize);
        let hi = region.hi.min(ncols as isize - 1);
        if lo > hi {
            return true;
        }
        self.lo <= lo && hi <= self.hi
    }

    /// Returns `true` if the policy allows every element of an `nrows × ncols` matrix.
    #[inline]
    pub fn is_dense_for(self, nrows: usize, ncols: usize) -> bool {
        self.covers(Self::dense(), nrows, ncols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert as fancy_assert;

    #[test]
    fn triangles() {
        fancy_assert!(Access::upper().allows(1, 1));
        fancy_assert!(Access::upper().allows(0, 3));
        fancy_assert!(!Access::upper().allows(2, 1));
        fancy_assert!(!Access::strict_upper().allows(2, 2));
        fancy_assert!(Access::strict_lower().allows(3, 0));
        fancy_assert!(!Access::strict_lower().allows(0, 0));
        fancy_assert!(Access::dense().allows(usize::MAX / 4, 0));
    }

    #[test]
    fn shift_and_transpose() {
        // the strict lower part of a matrix, seen from the block starting at row 2
        let below = Access::strict_lower().shifted(2, 0);
        fancy_assert!(below.allows(0, 1));
        fancy_assert!(!below.allows(0, 2));

        fancy_assert!(Access::strict_lower().transposed() == Access::strict_upper());
        fancy_assert!(Access::band(-2, 3).transposed() == Access::band(-3, 2));
        fancy_assert!(Access::dense().transposed().is_dense_for(7, 5));
        fancy_assert!(Access::dense().shifted(3, 0).is_dense_for(7, 5));
        fancy_assert!(Access::dense().shifted(0, 3).is_dense_for(7, 5));
    }

    #[test]
    fn covers_clips_to_matrix() {
        // a 4×3 matrix has diagonals -3..=2
        fancy_assert!(Access::band(-3, 2).is_dense_for(4, 3));
        fancy_assert!(!Access::band(-2, 2).is_dense_for(4, 3));
        fancy_assert!(Access::band(-1, 0).is_dense_for(1, 1));

        // the strict lower part of a 1×n matrix is empty
        fancy_assert!(Access::upper().covers(Access::strict_lower(), 1, 5));
        fancy_assert!(Access::upper().covers(Access::strict_lower(), 0, 0));
        fancy_assert!(!Access::upper().covers(Access::strict_lower(), 2, 5));

        fancy_assert!(Access::lower().covers(Access::strict_lower(), 6, 3));
        fancy_assert!(!Access::strict_lower().covers(Access::lower(), 6, 3));
    }

    #[test]
    fn intersection_never_widens() {
        let a = Access::band(-4, 1);
        let b = Access::band(-1, 6);
        fancy_assert!(a.intersect(b) == Access::band(-1, 1));
        fancy_assert!(a.intersect(Access::dense()) == a);
        fancy_assert!(!Access::upper().intersect(Access::strict_lower()).allows(0, 0));
    }
}
