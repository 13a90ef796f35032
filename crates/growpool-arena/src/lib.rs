//! Chunked bump-pointer arena and a container allocator adapter over it.
//!
//! Many same-lifetime objects are carved out of a few large chunks instead
//! of being allocated and freed one by one. The whole lot is reclaimed at
//! once, by clearing or dropping the pool. This crate contains `unsafe`
//! code only in `raw.rs` and in the [`Allocator`](allocator_api2::alloc::Allocator)
//! impl for [`PoolAllocator`].
//!
//! # Architecture
//!
//! ```text
//! MemPool (owner, !Sync)
//! ├── PoolConfig (fixed chunk_bytes)
//! ├── ChunkChain: Chunk[0] → Chunk[1] → … (bump counters + cursor)
//! │   └── RawChunk (CHUNK_ALIGN-aligned heap bytes, freed on drop)
//! └── Option<Box<dyn PoolObserver>> (diagnostics, e.g. TracingObserver)
//!
//! PoolAllocator<'a, T> (Copy handle, &'a MemPool)
//! └── allocator_api2::alloc::Allocator → Vec<T, _>, Box<T, _>, …
//! ```
//!
//! # Allocation policy
//!
//! - A request that fits the cursor chunk's tail is carved from it.
//! - Otherwise the cursor advances to the next chunk, restarting it from
//!   offset 0, or a new chunk is appended at the end of the chain.
//! - A request larger than one chunk fails with
//!   [`ArenaError::OverCapacityRequest`]; requests never span chunks.
//!
//! # Sharing
//!
//! Any number of [`PoolAllocator`]s (of any element type) may borrow one
//! pool; their allocations interleave in the same chain. Release through a
//! handle is a no-op, so all handles compare equal.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod allocator;
mod chunk;
pub mod config;
pub mod error;
pub mod observer;
pub mod pool;
mod raw;

// Public re-exports for the primary API surface.
pub use allocator::PoolAllocator;
pub use config::{PoolConfig, CHUNK_ALIGN};
pub use error::ArenaError;
pub use observer::{PoolEvent, PoolObserver, TracingObserver};
pub use pool::MemPool;
