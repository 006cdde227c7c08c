//! Workspace sizing protocol.
//!
//! Every routine that needs scratch memory has a companion `*_worksize` query that returns a
//! [`WorkInfo`], the minimum matrix shape of the scratch it needs. Needs are combined with `+`
//! when they are alive at the same time (one is carved after the other in the same buffer)
//! and with [`WorkInfo::min_max`] when they are alternatives that reuse the same memory.
//! Combination order mirrors the order of the calls in the sized algorithm.
//!
//! ```
//! use wy_core::workspace::WorkInfo;
//!
//! // a 4×4 triangular factor followed by a 4×10 product
//! let need = WorkInfo::new(4, 4) + WorkInfo::new(4, 10);
//! assert_eq!(need, WorkInfo::new(4, 14));
//!
//! // reused afterwards by a routine that needs a vector of length 10
//! let need = need.min_max(WorkInfo::new(10, 1));
//! assert_eq!(need.size(), 56);
//! ```
//!
//! Scratch memory is handed out as a [`PodStack`] by [`acquire`], and matrices are carved from
//! it with [`carve`].

use crate::{ComplexField, MatMut, Parallelism};
use core::ops::{Add, AddAssign};
use dyn_stack::{GlobalPodBuffer, PodStack, StackReq};

/// Minimum shape of the scratch memory needed by a routine.
///
/// The empty need is `(0, 1)`, which is also the default.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WorkInfo {
    pub m: usize,
    pub n: usize,
}

impl Default for WorkInfo {
    #[inline]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl WorkInfo {
    pub const EMPTY: Self = Self { m: 0, n: 1 };

    #[inline]
    pub const fn new(m: usize, n: usize) -> Self {
        Self { m, n }
    }

    /// Number of elements.
    #[inline]
    pub const fn size(&self) -> usize {
        self.m * self.n
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.size() == 0
    }

    #[inline]
    pub const fn transpose(self) -> Self {
        Self {
            m: self.n,
            n: self.m,
        }
    }

    /// Memory requirement of a buffer of `self.size()` elements of type `T`.
    #[inline]
    pub fn req<T: ComplexField>(&self) -> StackReq {
        StackReq::new::<T>(self.size())
    }

    /// Returns `true` if a buffer of shape `self` can hold a matrix of shape `other`.
    #[inline]
    pub const fn contains(&self, other: &Self) -> bool {
        self.m >= other.m && self.n >= other.n
    }

    /// Need of two alternatives sharing the same memory: the larger shape if one contains
    /// the other, otherwise a flat buffer large enough for both.
    #[inline]
    pub fn min_max(self, other: Self) -> Self {
        if self.contains(&other) {
            self
        } else if other.contains(&self) {
            other
        } else {
            Self::new(Ord::max(self.size(), other.size()), 1)
        }
    }
}

impl Add for WorkInfo {
    type Output = Self;

    /// Need of two buffers alive at the same time.
    #[inline]
    fn add(self, rhs: Self) -> Self {
        if self.is_empty() {
            rhs
        } else if rhs.is_empty() {
            self
        } else if self.m == rhs.m {
            Self::new(self.m, self.n + rhs.n)
        } else if self.n == rhs.n {
            Self::new(self.m + rhs.m, self.n)
        } else {
            Self::new(self.size() + rhs.size(), 1)
        }
    }
}

impl AddAssign for WorkInfo {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Origin of the scratch buffer used by a call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Provenance {
    /// The caller's buffer.
    Borrowed,
    /// A buffer allocated for the duration of the call.
    Private,
}

/// Returns a memory stack holding at least `info.size()` elements of type `T`.
///
/// The caller's buffer is used when it is large enough. Otherwise a zeroed buffer is allocated
/// into `local` and used instead, and the caller's buffer is left untouched.
pub fn acquire<'a, T: ComplexField>(
    info: WorkInfo,
    user: Option<&'a mut [T]>,
    local: &'a mut Option<GlobalPodBuffer>,
) -> (PodStack<'a>, Provenance) {
    match user {
        Some(buf) if buf.len() >= info.size() => (
            PodStack::new(bytemuck::cast_slice_mut::<T, u8>(buf)),
            Provenance::Borrowed,
        ),
        user => {
            if let Some(buf) = user {
                log::debug!(
                    "workspace of {} elements is smaller than the {}×{} needed, allocating",
                    buf.len(),
                    info.m,
                    info.n,
                );
            }
            let mem = local.insert(GlobalPodBuffer::new(info.req::<T>()));
            mem.fill(0u8);
            (PodStack::new(mem), Provenance::Private)
        }
    }
}

/// Takes an `nrows × ncols` column-major matrix off the top of `stack`.
///
/// # Panics
///
/// Panics if `stack` cannot hold `nrows * ncols` elements of type `T`.
#[track_caller]
#[inline]
pub fn carve<T: ComplexField>(
    stack: PodStack<'_>,
    nrows: usize,
    ncols: usize,
) -> (MatMut<'_, T>, PodStack<'_>) {
    let (buf, stack) = stack.make_raw::<T>(nrows * ncols);
    (MatMut::from_column_major_slice(buf, nrows, ncols), stack)
}

/// Configuration of the blocked routines.
#[derive(Debug)]
pub struct BlockedParams<'a, T> {
    /// Number of reflectors per block. Values larger than the number of reflectors are
    /// clamped; zero is rejected.
    pub blocksize: usize,
    /// Parallelism hint forwarded to the multiplication kernels.
    pub parallelism: Parallelism,
    /// Caller-provided scratch memory, used when it is at least as large as the routine's
    /// `*_worksize` query.
    pub work: Option<&'a mut [T]>,
}

impl<T> Default for BlockedParams<'_, T> {
    #[inline]
    fn default() -> Self {
        Self {
            blocksize: 32,
            parallelism: Parallelism::None,
            work: None,
        }
    }
}

impl<'a, T> BlockedParams<'a, T> {
    #[inline]
    pub fn with_blocksize(self, blocksize: usize) -> Self {
        Self { blocksize, ..self }
    }

    #[inline]
    pub fn with_parallelism(self, parallelism: Parallelism) -> Self {
        Self {
            parallelism,
            ..self
        }
    }

    #[inline]
    pub fn with_work(self, work: &'a mut [T]) -> Self {
        Self {
            work: Some(work),
            ..self
        }
    }
}

pub type GeqrfParams<'a, T> = BlockedParams<'a, T>;
pub type UngqrParams<'a, T> = BlockedParams<'a, T>;
pub type UnmlqParams<'a, T> = BlockedParams<'a, T>;
pub type UnmrqParams<'a, T> = BlockedParams<'a, T>;
