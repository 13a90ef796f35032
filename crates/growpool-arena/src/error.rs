//! Pool-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during pool operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// A single request is larger than one chunk. The pool never splits a
    /// request across chunks, so retrying cannot succeed.
    OverCapacityRequest {
        /// Number of bytes requested.
        requested: usize,
        /// Fixed capacity of every chunk.
        chunk_bytes: usize,
    },
    /// `num_elements * element_bytes` does not fit in `usize`.
    SizeOverflow {
        /// Requested element count.
        num_elements: usize,
        /// Size of one element in bytes.
        element_bytes: usize,
    },
    /// The requested alignment is stricter than chunk storage provides.
    UnsupportedAlignment {
        /// Alignment requested by the layout.
        align: usize,
        /// Alignment of chunk storage.
        max_align: usize,
    },
    /// The pool configuration was rejected at construction.
    InvalidConfig {
        /// What was wrong with it.
        reason: &'static str,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverCapacityRequest {
                requested,
                chunk_bytes,
            } => {
                write!(
                    f,
                    "request of {requested} bytes exceeds chunk capacity of {chunk_bytes} bytes"
                )
            }
            Self::SizeOverflow {
                num_elements,
                element_bytes,
            } => {
                write!(
                    f,
                    "request size overflows: {num_elements} elements of {element_bytes} bytes"
                )
            }
            Self::UnsupportedAlignment { align, max_align } => {
                write!(
                    f,
                    "alignment {align} exceeds chunk alignment of {max_align}"
                )
            }
            Self::InvalidConfig { reason } => write!(f, "invalid pool config: {reason}"),
        }
    }
}

impl Error for ArenaError {}
