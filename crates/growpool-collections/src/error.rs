//! Errors for capacity-controlled containers.

use std::error::Error;
use std::fmt;

/// Errors from resizing or reallocating a [`ManualCapacityVec`].
///
/// [`ManualCapacityVec`]: crate::ManualCapacityVec
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VecError {
    /// A resize asked for more elements than the current capacity holds.
    LenExceedsCapacity {
        /// Requested length.
        len: usize,
        /// Current capacity.
        capacity: usize,
    },
    /// A reallocation asked for less capacity than the current length.
    CapacityBelowLen {
        /// Requested capacity.
        capacity: usize,
        /// Current length.
        len: usize,
    },
    /// The requested capacity in bytes does not fit in `isize`.
    CapacityOverflow,
    /// The allocator could not provide the storage.
    Alloc,
}

impl fmt::Display for VecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LenExceedsCapacity { len, capacity } => {
                write!(f, "length {len} exceeds capacity {capacity}")
            }
            Self::CapacityBelowLen { capacity, len } => {
                write!(f, "capacity {capacity} is below current length {len}")
            }
            Self::CapacityOverflow => write!(f, "capacity overflow"),
            Self::Alloc => write!(f, "allocator failed to provide storage"),
        }
    }
}

impl Error for VecError {}

/// A push into a full [`ManualCapacityVec`]. Carries the rejected value.
///
/// [`ManualCapacityVec`]: crate::ManualCapacityVec
#[derive(Clone, PartialEq, Eq)]
pub struct PushError<T> {
    /// The value that was not pushed.
    pub value: T,
    /// Capacity of the full vector.
    pub capacity: usize,
}

impl<T> PushError<T> {
    /// Take back the rejected value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushError")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vector is full at capacity {}", self.capacity)
    }
}

impl<T> Error for PushError<T> {}
