//! growpool: a chunked bump-pointer memory pool for generic containers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the growpool sub-crates, together with the `allocator_api2` containers
//! that accept a [`PoolAllocator`](arena::PoolAllocator).
//!
//! # Quick start
//!
//! ```rust
//! use growpool::prelude::*;
//!
//! let pool = MemPool::new(1000).unwrap();
//! let alloc = PoolAllocator::<i32>::new(&pool);
//!
//! // A growable vector and a fixed-capacity vector sharing one pool.
//! let mut v = Vec::new_in(alloc);
//! let mut fixed = ManualCapacityVec::with_capacity_in(100, alloc).unwrap();
//! for i in 0..100 {
//!     v.push(i);
//!     fixed.push(i).unwrap();
//! }
//! assert_eq!(v.as_slice(), fixed.as_slice());
//! assert!(pool.contains(v.as_ptr()) && pool.contains(fixed.as_ptr()));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `growpool-arena` | `MemPool`, `PoolAllocator`, config, errors, observers |
//! | [`collections`] | `growpool-collections` | `ManualCapacityVec` |
//! | [`containers`] | `allocator-api2` | `Vec` and `Box` that accept a custom allocator |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// The pool, its allocator handle, configuration and diagnostics
/// (`growpool-arena`).
pub use growpool_arena as arena;

/// Containers with caller-controlled capacity (`growpool-collections`).
pub use growpool_collections as collections;

/// Allocator-aware standard containers (`allocator-api2`).
pub mod containers {
    pub use allocator_api2::boxed::Box;
    pub use allocator_api2::vec::Vec;
}

/// Common imports for building containers on a pool.
///
/// Note that this shadows the standard `Vec` and `Box` with their
/// allocator-aware counterparts.
pub mod prelude {
    pub use crate::arena::{ArenaError, MemPool, PoolAllocator, PoolConfig, TracingObserver};
    pub use crate::collections::{ManualCapacityVec, PushError, VecError};
    pub use crate::containers::{Box, Vec};
}
