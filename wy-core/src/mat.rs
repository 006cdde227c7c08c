use crate::{access::Access, ComplexField};
use assert2::{assert as fancy_assert, debug_assert as fancy_debug_assert};
use core::{
    fmt::Debug,
    marker::PhantomData,
    ops::{Index, IndexMut, Range},
    ptr::NonNull,
};
use reborrow::*;

struct MatrixSliceBase<T> {
    ptr: NonNull<T>,
    nrows: usize,
    ncols: usize,
    row_stride: isize,
    col_stride: isize,
    access: Access,
}

impl<T> Copy for MatrixSliceBase<T> {}
impl<T> Clone for MatrixSliceBase<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> MatrixSliceBase<T> {
    #[inline]
    fn ptr_at(self, i: usize, j: usize) -> *mut T {
        self.ptr
            .as_ptr()
            .wrapping_offset(i as isize * self.row_stride + j as isize * self.col_stride)
    }

    /// # Safety
    ///
    /// The block must lie inside the matrix.
    #[inline]
    unsafe fn submatrix_unchecked(self, i: usize, j: usize, nrows: usize, ncols: usize) -> Self {
        Self {
            ptr: NonNull::new_unchecked(self.ptr_at(i, j)),
            nrows,
            ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            access: self.access.shifted(i, j),
        }
    }

    #[inline]
    fn transpose(self) -> Self {
        Self {
            ptr: self.ptr,
            nrows: self.ncols,
            ncols: self.nrows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
            access: self.access.transposed(),
        }
    }

    #[track_caller]
    #[inline]
    fn check_block(self, i: usize, j: usize, nrows: usize, ncols: usize) {
        fancy_assert!(i <= self.nrows);
        fancy_assert!(j <= self.ncols);
        fancy_assert!(nrows <= self.nrows - i);
        fancy_assert!(ncols <= self.ncols - j);
    }

    #[track_caller]
    #[inline]
    fn check_element(self, i: usize, j: usize) {
        fancy_assert!(i < self.nrows);
        fancy_assert!(j < self.ncols);
        fancy_debug_assert!(self.access.allows(i, j));
    }
}

/// Matrix view with general row and column strides.
///
/// The view also carries an [`Access`] policy restricting the elements it may read.
pub struct MatRef<'a, T> {
    base: MatrixSliceBase<T>,
    _marker: PhantomData<&'a T>,
}

/// Mutable matrix view with general row and column strides.
///
/// For usage examples, see [`MatRef`].
pub struct MatMut<'a, T> {
    base: MatrixSliceBase<T>,
    _marker: PhantomData<&'a mut T>,
}

unsafe impl<'a, T: Sync> Sync for MatRef<'a, T> {}
unsafe impl<'a, T: Sync> Send for MatRef<'a, T> {}
unsafe impl<'a, T: Sync> Sync for MatMut<'a, T> {}
unsafe impl<'a, T: Send> Send for MatMut<'a, T> {}

impl<'a, T> Copy for MatRef<'a, T> {}
impl<'a, T> Clone for MatRef<'a, T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<'b, 'a, T> Reborrow<'b> for MatRef<'a, T> {
    type Target = MatRef<'b, T>;
    #[inline]
    fn rb(&'b self) -> Self::Target {
        *self
    }
}

impl<'b, 'a, T> ReborrowMut<'b> for MatRef<'a, T> {
    type Target = MatRef<'b, T>;
    #[inline]
    fn rb_mut(&'b mut self) -> Self::Target {
        *self
    }
}

impl<'a, T> IntoConst for MatRef<'a, T> {
    type Target = MatRef<'a, T>;
    #[inline]
    fn into_const(self) -> Self::Target {
        self
    }
}

impl<'b, 'a, T> Reborrow<'b> for MatMut<'a, T> {
    type Target = MatRef<'b, T>;
    #[inline]
    fn rb(&'b self) -> Self::Target {
        MatRef {
            base: self.base,
            _marker: PhantomData,
        }
    }
}

impl<'b, 'a, T> ReborrowMut<'b> for MatMut<'a, T> {
    type Target = MatMut<'b, T>;
    #[inline]
    fn rb_mut(&'b mut self) -> Self::Target {
        MatMut {
            base: self.base,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> IntoConst for MatMut<'a, T> {
    type Target = MatRef<'a, T>;
    #[inline]
    fn into_const(self) -> Self::Target {
        MatRef {
            base: self.base,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> MatRef<'a, T> {
    /// Returns a matrix slice from the given arguments.
    /// `ptr`: pointer to the first element of the matrix.
    /// `nrows`: number of rows of the matrix.
    /// `ncols`: number of columns of the matrix.
    /// `row_stride`: offset between the first elements of two successive rows in the matrix.
    /// `col_stride`: offset between the first elements of two successive columns in the matrix.
    ///
    /// The view starts out with a dense access policy.
    ///
    /// # Safety
    ///
    /// `ptr` must be non null and properly aligned for type `T`.
    /// For each `i < nrows` and `j < ncols`,
    /// `ptr.offset(i as isize * row_stride + j as isize * col_stride)` must point to a valid
    /// initialized object of type `T`, unless memory pointing to that address is never accessed.
    /// The referenced memory must not be mutated during the lifetime `'a`.
    ///
    /// # Example
    ///
    /// ```
    /// use wy_core::MatRef;
    ///
    /// let nan = f64::NAN;
    /// let data = vec![0.0, 1.0, nan, 2.0, 3.0, nan, 4.0, 5.0];
    ///
    /// let m = unsafe { MatRef::from_raw_parts(data.as_ptr(), 2, 3, 1, 3) };
    ///
    /// assert_eq!(m.nrows(), 2);
    /// assert_eq!(m.ncols(), 3);
    /// assert_eq!(m[(1, 0)], 1.0);
    /// assert_eq!(m[(0, 2)], 4.0);
    /// ```
    #[inline]
    pub unsafe fn from_raw_parts(
        ptr: *const T,
        nrows: usize,
        ncols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        Self {
            base: MatrixSliceBase {
                ptr: NonNull::new_unchecked(ptr as *mut T),
                nrows,
                ncols,
                row_stride,
                col_stride,
                access: Access::dense(),
            },
            _marker: PhantomData,
        }
    }

    /// Views the first `nrows * ncols` elements of `slice` as a column-major matrix.
    #[track_caller]
    #[inline]
    pub fn from_column_major_slice(slice: &'a [T], nrows: usize, ncols: usize) -> Self {
        fancy_assert!(slice.len() >= nrows * ncols);
        unsafe { Self::from_raw_parts(slice.as_ptr(), nrows, ncols, 1, nrows as isize) }
    }

    /// Returns a pointer to the first (top left) element of the matrix.
    #[inline]
    pub fn as_ptr(self) -> *const T {
        self.base.ptr.as_ptr()
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.base.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.base.ncols
    }

    #[inline]
    pub fn row_stride(&self) -> isize {
        self.base.row_stride
    }

    #[inline]
    pub fn col_stride(&self) -> isize {
        self.base.col_stride
    }

    /// Returns the access policy of the view.
    #[inline]
    pub fn access(&self) -> Access {
        self.base.access
    }

    /// Restricts the view to the elements also allowed by `access`.
    #[inline]
    pub fn with_access(self, access: Access) -> Self {
        let mut base = self.base;
        base.access = base.access.intersect(access);
        Self {
            base,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the element at the given position.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds. Touching an element outside of the access
    /// policy panics in debug builds.
    #[track_caller]
    #[inline]
    pub fn get(self, i: usize, j: usize) -> &'a T {
        self.base.check_element(i, j);
        unsafe { &*self.base.ptr_at(i, j) }
    }

    /// Reads the element at the given position.
    #[track_caller]
    #[inline]
    pub fn read(&self, i: usize, j: usize) -> T
    where
        T: Copy,
    {
        *(*self).get(i, j)
    }

    /// Splits the matrix into four corner parts in the following order: top left, top right,
    /// bottom left, bottom right.
    ///
    /// # Example
    ///
    /// ```
    /// use wy_core::mat;
    ///
    /// let m = mat![[0.0, 2.0, 4.0], [1.0, 3.0, 5.0]];
    /// let (top_left, top_right, bot_left, bot_right) = m.as_ref().split_at(1, 1);
    ///
    /// assert_eq!(top_left[(0, 0)], 0.0);
    /// assert_eq!(top_right.ncols(), 2);
    /// assert_eq!(bot_left[(0, 0)], 1.0);
    /// assert_eq!(bot_right[(0, 1)], 5.0);
    /// ```
    #[track_caller]
    #[inline]
    pub fn split_at(self, i: usize, j: usize) -> (Self, Self, Self, Self) {
        fancy_assert!(i <= self.nrows());
        fancy_assert!(j <= self.ncols());
        let (m, n) = (self.nrows(), self.ncols());
        let base = self.base;
        unsafe {
            (
                Self::from_base(base.submatrix_unchecked(0, 0, i, j)),
                Self::from_base(base.submatrix_unchecked(0, j, i, n - j)),
                Self::from_base(base.submatrix_unchecked(i, 0, m - i, j)),
                Self::from_base(base.submatrix_unchecked(i, j, m - i, n - j)),
            )
        }
    }

    /// Splits the matrix horizontally into two parts in the following order: top, bottom.
    #[track_caller]
    #[inline]
    pub fn split_at_row(self, i: usize) -> (Self, Self) {
        let (_, top, _, bottom) = self.split_at(i, 0);
        (top, bottom)
    }

    /// Splits the matrix vertically into two parts in the following order: left, right.
    #[track_caller]
    #[inline]
    pub fn split_at_col(self, j: usize) -> (Self, Self) {
        let (_, _, left, right) = self.split_at(0, j);
        (left, right)
    }

    /// Returns the `nrows × ncols` block whose top left corner is at `(i, j)`.
    ///
    /// # Example
    ///
    /// ```
    /// use wy_core::mat;
    ///
    /// let m = mat![
    ///     [1.0, 5.0, 9.0],
    ///     [2.0, 6.0, 10.0],
    ///     [3.0, 7.0, 11.0],
    ///     [4.0, 8.0, 12.0f64],
    /// ];
    ///
    /// let sub = m.as_ref().submatrix(2, 1, 2, 2);
    ///
    /// assert_eq!(sub[(0, 0)], 7.0);
    /// assert_eq!(sub[(1, 1)], 12.0);
    /// ```
    #[track_caller]
    #[inline]
    pub fn submatrix(self, i: usize, j: usize, nrows: usize, ncols: usize) -> Self {
        self.base.check_block(i, j, nrows, ncols);
        unsafe { Self::from_base(self.base.submatrix_unchecked(i, j, nrows, ncols)) }
    }

    /// Returns `nrows` rows starting at row `i`.
    #[track_caller]
    #[inline]
    pub fn subrows(self, i: usize, nrows: usize) -> Self {
        let ncols = self.ncols();
        self.submatrix(i, 0, nrows, ncols)
    }

    /// Returns `ncols` columns starting at column `j`.
    #[track_caller]
    #[inline]
    pub fn subcols(self, j: usize, ncols: usize) -> Self {
        let nrows = self.nrows();
        self.submatrix(0, j, nrows, ncols)
    }

    /// Returns column `j` as an `nrows × 1` view.
    #[track_caller]
    #[inline]
    pub fn col(self, j: usize) -> Self {
        fancy_assert!(j < self.ncols());
        self.subcols(j, 1)
    }

    /// Returns row `i` as a `1 × ncols` view.
    #[track_caller]
    #[inline]
    pub fn row(self, i: usize) -> Self {
        fancy_assert!(i < self.nrows());
        self.subrows(i, 1)
    }

    /// Returns the transpose of `self`.
    #[inline]
    pub fn transpose(self) -> Self {
        Self::from_base(self.base.transpose())
    }

    /// Copies the viewed elements into a new owned matrix.
    ///
    /// Elements outside of the access policy are not read and are set to zero.
    pub fn to_owned(&self) -> Mat<T>
    where
        T: ComplexField,
    {
        let base = self.base;
        Mat::from_fn(self.nrows(), self.ncols(), |i, j| {
            if base.access.allows(i, j) {
                unsafe { *base.ptr_at(i, j) }
            } else {
                T::zero()
            }
        })
    }

    #[inline]
    fn from_base(base: MatrixSliceBase<T>) -> Self {
        Self {
            base,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> MatMut<'a, T> {
    /// Returns a mutable matrix slice from the given arguments.
    ///
    /// # Safety
    ///
    /// Same as [`MatRef::from_raw_parts`], and additionally the referenced memory must not be
    /// accessed through any other pointer during the lifetime `'a`, and distinct positions
    /// must not alias.
    #[inline]
    pub unsafe fn from_raw_parts(
        ptr: *mut T,
        nrows: usize,
        ncols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        Self {
            base: MatrixSliceBase {
                ptr: NonNull::new_unchecked(ptr),
                nrows,
                ncols,
                row_stride,
                col_stride,
                access: Access::dense(),
            },
            _marker: PhantomData,
        }
    }

    /// Views the first `nrows * ncols` elements of `slice` as a mutable column-major matrix.
    #[track_caller]
    #[inline]
    pub fn from_column_major_slice(slice: &'a mut [T], nrows: usize, ncols: usize) -> Self {
        fancy_assert!(slice.len() >= nrows * ncols);
        unsafe { Self::from_raw_parts(slice.as_mut_ptr(), nrows, ncols, 1, nrows as isize) }
    }

    /// Returns a mutable pointer to the first (top left) element of the matrix.
    #[inline]
    pub fn as_ptr(self) -> *mut T {
        self.base.ptr.as_ptr()
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.base.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.base.ncols
    }

    #[inline]
    pub fn row_stride(&self) -> isize {
        self.base.row_stride
    }

    #[inline]
    pub fn col_stride(&self) -> isize {
        self.base.col_stride
    }

    /// Returns the access policy of the view.
    #[inline]
    pub fn access(&self) -> Access {
        self.base.access
    }

    /// Restricts the view to the elements also allowed by `access`.
    #[inline]
    pub fn with_access(self, access: Access) -> Self {
        let mut base = self.base;
        base.access = base.access.intersect(access);
        Self::from_base(base)
    }

    /// Returns a mutable reference to the element at the given position.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds. Touching an element outside of the access
    /// policy panics in debug builds.
    #[track_caller]
    #[inline]
    pub fn get_mut(self, i: usize, j: usize) -> &'a mut T {
        self.base.check_element(i, j);
        unsafe { &mut *self.base.ptr_at(i, j) }
    }

    /// Reads the element at the given position.
    #[track_caller]
    #[inline]
    pub fn read(&self, i: usize, j: usize) -> T
    where
        T: Copy,
    {
        self.rb().read(i, j)
    }

    /// Writes `value` to the element at the given position.
    #[track_caller]
    #[inline]
    pub fn write(&mut self, i: usize, j: usize, value: T) {
        *self.rb_mut().get_mut(i, j) = value;
    }

    /// Writes `value` to every element allowed by the access policy.
    pub fn fill(&mut self, value: T)
    where
        T: Copy,
    {
        let access = self.access();
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                if access.allows(i, j) {
                    self.write(i, j, value);
                }
            }
        }
    }

    /// Splits the matrix into four disjoint corner parts in the following order: top left,
    /// top right, bottom left, bottom right.
    #[track_caller]
    #[inline]
    pub fn split_at(self, i: usize, j: usize) -> (Self, Self, Self, Self) {
        let (top_left, top_right, bot_left, bot_right) = self.into_const().split_at(i, j);
        unsafe {
            (
                top_left.const_cast(),
                top_right.const_cast(),
                bot_left.const_cast(),
                bot_right.const_cast(),
            )
        }
    }

    /// Splits the matrix horizontally into two disjoint parts: top, bottom.
    #[track_caller]
    #[inline]
    pub fn split_at_row(self, i: usize) -> (Self, Self) {
        let (_, top, _, bottom) = self.split_at(i, 0);
        (top, bottom)
    }

    /// Splits the matrix vertically into two disjoint parts: left, right.
    #[track_caller]
    #[inline]
    pub fn split_at_col(self, j: usize) -> (Self, Self) {
        let (_, _, left, right) = self.split_at(0, j);
        (left, right)
    }

    /// Returns the `nrows × ncols` block whose top left corner is at `(i, j)`.
    #[track_caller]
    #[inline]
    pub fn submatrix(self, i: usize, j: usize, nrows: usize, ncols: usize) -> Self {
        unsafe { self.into_const().submatrix(i, j, nrows, ncols).const_cast() }
    }

    /// Returns `nrows` rows starting at row `i`.
    #[track_caller]
    #[inline]
    pub fn subrows(self, i: usize, nrows: usize) -> Self {
        unsafe { self.into_const().subrows(i, nrows).const_cast() }
    }

    /// Returns `ncols` columns starting at column `j`.
    #[track_caller]
    #[inline]
    pub fn subcols(self, j: usize, ncols: usize) -> Self {
        unsafe { self.into_const().subcols(j, ncols).const_cast() }
    }

    /// Returns column `j` as an `nrows × 1` view.
    #[track_caller]
    #[inline]
    pub fn col(self, j: usize) -> Self {
        unsafe { self.into_const().col(j).const_cast() }
    }

    /// Returns row `i` as a `1 × ncols` view.
    #[track_caller]
    #[inline]
    pub fn row(self, i: usize) -> Self {
        unsafe { self.into_const().row(i).const_cast() }
    }

    /// Returns the transpose of `self`.
    #[inline]
    pub fn transpose(self) -> Self {
        Self::from_base(self.base.transpose())
    }

    #[inline]
    fn from_base(base: MatrixSliceBase<T>) -> Self {
        Self {
            base,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> MatRef<'a, T> {
    /// # Safety
    ///
    /// `self` must have been obtained from a `MatMut<'a, T>` that is no longer used.
    #[inline]
    unsafe fn const_cast(self) -> MatMut<'a, T> {
        MatMut::from_base(self.base)
    }
}

impl<T> Index<(usize, usize)> for MatRef<'_, T> {
    type Output = T;

    #[track_caller]
    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        (*self).get(i, j)
    }
}

impl<T> Index<(usize, usize)> for MatMut<'_, T> {
    type Output = T;

    #[track_caller]
    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        self.rb().get(i, j)
    }
}

impl<T> IndexMut<(usize, usize)> for MatMut<'_, T> {
    #[track_caller]
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Self::Output {
        self.rb_mut().get_mut(i, j)
    }
}

impl<'a, T: Debug> Debug for MatRef<'a, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct DebugRow<'a, T>(MatRef<'a, T>);
        struct Hidden;

        impl Debug for Hidden {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("_")
            }
        }

        impl<'a, T: Debug> Debug for DebugRow<'a, T> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let base = self.0.base;
                let mut list = f.debug_list();
                for j in 0..base.ncols {
                    if base.access.allows(0, j) {
                        list.entry(unsafe { &*base.ptr_at(0, j) });
                    } else {
                        list.entry(&Hidden);
                    }
                }
                list.finish()
            }
        }

        let mut list = f.debug_list();
        for i in 0..self.nrows() {
            list.entry(&DebugRow(self.row(i)));
        }
        list.finish()
    }
}

impl<'a, T: Debug> Debug for MatMut<'a, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.rb().fmt(f)
    }
}

/// Read access to a rectangular array of elements, by `(row, col)`.
pub trait MatrixView: Sized {
    type Elem: Copy;

    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn read(&self, i: usize, j: usize) -> Self::Elem;
    /// Returns the sub-view covering `rows × cols`.
    fn slice(self, rows: Range<usize>, cols: Range<usize>) -> Self;
    /// Elements this view may read.
    fn read_policy(&self) -> Access;
}

/// Write access to a rectangular array of elements, by `(row, col)`.
pub trait MatrixViewMut: MatrixView {
    fn write(&mut self, i: usize, j: usize, value: Self::Elem);
    /// Elements this view may write.
    fn write_policy(&self) -> Access;
}

impl<'a, T: Copy> MatrixView for MatRef<'a, T> {
    type Elem = T;

    #[inline]
    fn nrows(&self) -> usize {
        self.base.nrows
    }
    #[inline]
    fn ncols(&self) -> usize {
        self.base.ncols
    }
    #[track_caller]
    #[inline]
    fn read(&self, i: usize, j: usize) -> T {
        MatRef::read(self, i, j)
    }
    #[track_caller]
    #[inline]
    fn slice(self, rows: Range<usize>, cols: Range<usize>) -> Self {
        fancy_assert!(rows.start <= rows.end);
        fancy_assert!(cols.start <= cols.end);
        self.submatrix(rows.start, cols.start, rows.len(), cols.len())
    }
    #[inline]
    fn read_policy(&self) -> Access {
        self.base.access
    }
}

impl<'a, T: Copy> MatrixView for MatMut<'a, T> {
    type Elem = T;

    #[inline]
    fn nrows(&self) -> usize {
        self.base.nrows
    }
    #[inline]
    fn ncols(&self) -> usize {
        self.base.ncols
    }
    #[track_caller]
    #[inline]
    fn read(&self, i: usize, j: usize) -> T {
        MatMut::read(self, i, j)
    }
    #[track_caller]
    #[inline]
    fn slice(self, rows: Range<usize>, cols: Range<usize>) -> Self {
        fancy_assert!(rows.start <= rows.end);
        fancy_assert!(cols.start <= cols.end);
        self.submatrix(rows.start, cols.start, rows.len(), cols.len())
    }
    #[inline]
    fn read_policy(&self) -> Access {
        self.base.access
    }
}

impl<'a, T: Copy> MatrixViewMut for MatMut<'a, T> {
    #[track_caller]
    #[inline]
    fn write(&mut self, i: usize, j: usize, value: T) {
        MatMut::write(self, i, j, value)
    }
    #[inline]
    fn write_policy(&self) -> Access {
        self.base.access
    }
}

/// Owned column-major matrix.
#[derive(Clone, PartialEq)]
pub struct Mat<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

impl<T> Mat<T> {
    /// Returns a new matrix with dimensions `(nrows, ncols)`, filled with the provided function.
    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Column-major storage, with a leading dimension equal to `self.nrows()`.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    pub fn as_ref(&self) -> MatRef<'_, T> {
        MatRef::from_column_major_slice(&self.data, self.nrows, self.ncols)
    }

    #[inline]
    pub fn as_mut(&mut self) -> MatMut<'_, T> {
        MatMut::from_column_major_slice(&mut self.data, self.nrows, self.ncols)
    }

    #[track_caller]
    #[inline]
    pub fn read(&self, i: usize, j: usize) -> T
    where
        T: Copy,
    {
        self[(i, j)]
    }

    #[track_caller]
    #[inline]
    pub fn write(&mut self, i: usize, j: usize, value: T) {
        self[(i, j)] = value;
    }
}

impl<T: ComplexField> Mat<T> {
    /// Returns a new matrix with dimensions `(nrows, ncols)`, filled with zeros.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::from_fn(nrows, ncols, |_, _| T::zero())
    }

    /// Returns a new matrix with dimensions `(nrows, ncols)`, with ones on the diagonal and
    /// zeros elsewhere.
    pub fn identity(nrows: usize, ncols: usize) -> Self {
        Self::from_fn(nrows, ncols, |i, j| if i == j { T::one() } else { T::zero() })
    }
}

impl<T> Index<(usize, usize)> for Mat<T> {
    type Output = T;

    #[track_caller]
    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        fancy_assert!(i < self.nrows);
        fancy_assert!(j < self.ncols);
        &self.data[i + j * self.nrows]
    }
}

impl<T> IndexMut<(usize, usize)> for Mat<T> {
    #[track_caller]
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Self::Output {
        fancy_assert!(i < self.nrows);
        fancy_assert!(j < self.ncols);
        &mut self.data[i + j * self.nrows]
    }
}

impl<T: Debug> Debug for Mat<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.as_ref().fmt(f)
    }
}

/// Conversion of owned or borrowed matrices to a read-only view.
pub trait AsMatRef<T> {
    fn as_mat_ref(&self) -> MatRef<'_, T>;
}

/// Conversion of owned or borrowed matrices to a mutable view.
pub trait AsMatMut<T> {
    fn as_mat_mut(&mut self) -> MatMut<'_, T>;
}

impl<T> AsMatRef<T> for Mat<T> {
    #[inline]
    fn as_mat_ref(&self) -> MatRef<'_, T> {
        self.as_ref()
    }
}

impl<T> AsMatRef<T> for MatRef<'_, T> {
    #[inline]
    fn as_mat_ref(&self) -> MatRef<'_, T> {
        *self
    }
}

impl<T> AsMatRef<T> for MatMut<'_, T> {
    #[inline]
    fn as_mat_ref(&self) -> MatRef<'_, T> {
        self.rb()
    }
}

impl<T> AsMatMut<T> for Mat<T> {
    #[inline]
    fn as_mat_mut(&mut self) -> MatMut<'_, T> {
        self.as_mut()
    }
}

impl<T> AsMatMut<T> for MatMut<'_, T> {
    #[inline]
    fn as_mat_mut(&mut self) -> MatMut<'_, T> {
        self.rb_mut()
    }
}

/// Creates a [`Mat`] containing the arguments, given row by row.
///
/// ```
/// use wy_core::mat;
///
/// let matrix = mat![
///     [1.0, 5.0, 9.0],
///     [2.0, 6.0, 10.0],
///     [3.0, 7.0, 11.0],
///     [4.0, 8.0, 12.0f64],
/// ];
///
/// assert_eq!(matrix.read(0, 0), 1.0);
/// assert_eq!(matrix.read(1, 0), 2.0);
/// assert_eq!(matrix.read(3, 2), 12.0);
/// ```
#[macro_export]
macro_rules! mat {
    () => {
        compile_error!("number of columns in the matrix is ambiguous");
    };

    ($([$($v:expr),* $(,)?] ),+ $(,)?) => {{
        let rows = [$([$($v),*]),+];
        let nrows = rows.len();
        let ncols = rows[0].len();
        $crate::Mat::from_fn(nrows, ncols, |i, j| rows[i][j])
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c64;
    use assert2::assert as fancy_assert;

    #[test]
    fn basic_slice() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0f64];
        let m = MatRef::from_column_major_slice(&data, 3, 2);

        fancy_assert!(m.nrows() == 3);
        fancy_assert!(m.ncols() == 2);
        fancy_assert!(m[(2, 0)] == 3.0);
        fancy_assert!(m[(0, 1)] == 4.0);
        fancy_assert!(m.transpose()[(0, 2)] == 3.0);
        fancy_assert!(m.transpose()[(1, 2)] == 6.0);
        fancy_assert!(m.col(1).read(2, 0) == 6.0);
        fancy_assert!(m.row(1).read(0, 1) == 5.0);
    }

    #[test]
    fn mat_macro_is_row_major() {
        let m = mat![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0f64]];
        fancy_assert!(m.nrows() == 3);
        fancy_assert!(m.ncols() == 2);
        fancy_assert!(m.as_slice() == &[1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn split_mut_is_disjoint() {
        let mut m = Mat::<f64>::zeros(4, 5);
        {
            let (mut left, mut right) = m.as_mut().split_at_col(2);
            left.fill(1.0);
            right.fill(2.0);
        }
        {
            let (mut top, mut bottom) = m.as_mut().subcols(1, 3).split_at_row(1);
            top.write(0, 0, 7.0);
            bottom.write(2, 2, 8.0);
        }
        fancy_assert!(m.read(3, 1) == 1.0);
        fancy_assert!(m.read(0, 4) == 2.0);
        fancy_assert!(m.read(0, 1) == 7.0);
        fancy_assert!(m.read(3, 3) == 8.0);
    }

    #[test]
    fn restricted_fill_and_to_owned() {
        let mut m = Mat::<c64>::identity(3, 3);
        m.as_mut()
            .with_access(Access::strict_upper())
            .fill(c64::new(0.0, 1.0));
        fancy_assert!(m.read(0, 2) == c64::new(0.0, 1.0));
        fancy_assert!(m.read(1, 1) == c64::new(1.0, 0.0));
        fancy_assert!(m.read(2, 0) == c64::new(0.0, 0.0));

        let lower = m.as_ref().with_access(Access::lower()).to_owned();
        fancy_assert!(lower == Mat::identity(3, 3));
    }

    #[test]
    fn sub_views_inherit_access() {
        let m = Mat::<f64>::from_fn(5, 5, |i, j| (i * 5 + j) as f64);
        let lower = m.as_ref().with_access(Access::strict_lower());
        let block = lower.submatrix(2, 1, 3, 2);
        fancy_assert!(block.access().allows(0, 0));
        fancy_assert!(!block.access().allows(0, 1));
        fancy_assert!(block.read(1, 1) == 17.0);
        fancy_assert!(block.transpose().access().allows(1, 1));

        let view = m.as_ref().slice(1..3, 2..5);
        fancy_assert!(view.nrows() == 2);
        fancy_assert!(view.ncols() == 3);
        fancy_assert!(MatrixView::read(&view, 1, 2) == 14.0);
        fancy_assert!(view.read_policy().is_dense_for(2, 3));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic]
    fn reading_outside_policy_panics() {
        let m = Mat::<f64>::identity(3, 3);
        let upper = m.as_ref().with_access(Access::strict_upper());
        let _ = upper.read(1, 1);
    }

    #[test]
    fn generic_view_traits() {
        fn sum<V: MatrixView<Elem = f64>>(v: &V) -> f64 {
            let mut acc = 0.0;
            for j in 0..v.ncols() {
                for i in 0..v.nrows() {
                    acc += v.read(i, j);
                }
            }
            acc
        }

        let mut m = mat![[1.0, 2.0], [3.0, 4.0f64]];
        fancy_assert!(sum(&m.as_ref()) == 10.0);
        let mut view = m.as_mut();
        MatrixViewMut::write(&mut view, 0, 0, 11.0);
        fancy_assert!(sum(&view) == 20.0);
        fancy_assert!(view.write_policy() == Access::dense());
        fancy_assert!(sum(&m.as_mat_ref()) == 20.0);
        fancy_assert!(m.as_mat_mut().read(0, 0) == 11.0);
    }
}
