//! Handle validation errors

use core::fmt;

/// Why a handle failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    Null,
    /// The slot was released, and possibly reused, after the handle was issued
    Stale,
    /// The index was never allocated by this allocator
    OutOfBounds,
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleError::Null => write!(f, "null handle"),
            HandleError::Stale => write!(f, "slot was released since the handle was issued"),
            HandleError::OutOfBounds => write!(f, "slot index was never allocated"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HandleError {}
