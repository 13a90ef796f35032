//! Containers with caller-controlled capacity.
//!
//! [`ManualCapacityVec`] never grows on its own: `push` and `resize` fail
//! once capacity is reached, and only [`ManualCapacityVec::realloc`] moves
//! the elements into a new buffer. That makes its allocation pattern
//! predictable, which pairs well with a bump arena where every abandoned
//! buffer stays allocated until the arena is cleared.
//!
//! The container is generic over [`allocator_api2::alloc::Allocator`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod manual_vec;

pub use error::{PushError, VecError};
pub use manual_vec::ManualCapacityVec;
