//! Parameter errors reported by the routines of the library.

/// Error returned when a routine is called with arguments it cannot accept.
///
/// Errors are detected before any output is written, so the outputs of a failed call are
/// left untouched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LapackError {
    /// Argument number `position` (1-based, in the order of the routine's parameters) of
    /// `routine` has an illegal value or an incompatible shape or access policy.
    #[error("{routine}: illegal value in argument {position}")]
    InvalidArgument {
        routine: &'static str,
        position: usize,
    },
}

impl LapackError {
    /// 1-based position of the offending argument.
    #[inline]
    pub fn position(&self) -> usize {
        match *self {
            LapackError::InvalidArgument { position, .. } => position,
        }
    }
}

/// Returns `LapackError::InvalidArgument` from the enclosing function unless `cond` holds.
///
/// ```
/// use wy_core::{lapack_check, LapackError};
///
/// fn f(k: usize, n: usize) -> Result<(), LapackError> {
///     lapack_check!(k <= n, "f", 1);
///     Ok(())
/// }
///
/// assert!(f(1, 2).is_ok());
/// assert_eq!(f(3, 2).unwrap_err().position(), 1);
/// ```
#[macro_export]
macro_rules! lapack_check {
    ($cond: expr, $routine: expr, $position: expr $(,)?) => {
        if !($cond) {
            return ::core::result::Result::Err($crate::error::LapackError::InvalidArgument {
                routine: $routine,
                position: $position,
            });
        }
    };
}
