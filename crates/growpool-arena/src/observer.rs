//! Diagnostics hook for pool activity.
//!
//! A pool reports what it does through an optional [`PoolObserver`]. Events
//! are emitted after the chunk bookkeeping has been updated, so an observer
//! always sees a consistent pool state and cannot perturb an allocation in
//! progress. With no observer installed the only cost is an `Option` check.

use std::fmt;

/// Something the pool did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolEvent {
    /// A new chunk was allocated and appended to the chain.
    ChunkCreated {
        /// Position of the chunk in the chain.
        chunk: usize,
        /// Capacity of the chunk in bytes.
        bytes: usize,
    },
    /// The cursor advanced to an existing chunk left over from before the
    /// last clear.
    ChunkReused {
        /// Position of the chunk in the chain.
        chunk: usize,
    },
    /// A request was served from the cursor chunk's tail.
    Carved {
        /// Chunk the bytes came from.
        chunk: usize,
        /// Offset of the region within the chunk.
        offset: usize,
        /// Size of the region in bytes.
        bytes: usize,
    },
    /// The pool was cleared.
    Cleared {
        /// Number of chunks retained for reuse.
        chunks: usize,
    },
    /// A request was rejected for being larger than a chunk.
    OverCapacity {
        /// Number of bytes requested.
        requested: usize,
        /// Fixed capacity of every chunk.
        chunk_bytes: usize,
    },
    /// The pool was dropped and all chunk storage released.
    Released {
        /// Number of chunks freed.
        chunks: usize,
        /// Total bytes freed.
        bytes: usize,
    },
}

impl fmt::Display for PoolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChunkCreated { chunk, bytes } => {
                write!(f, "allocated chunk {chunk} ({bytes} bytes)")
            }
            Self::ChunkReused { chunk } => write!(f, "reusing chunk {chunk}"),
            Self::Carved {
                chunk,
                offset,
                bytes,
            } => write!(f, "using {bytes} bytes at offset {offset} in chunk {chunk}"),
            Self::Cleared { chunks } => write!(f, "cleared pool, {chunks} chunks retained"),
            Self::OverCapacity {
                requested,
                chunk_bytes,
            } => write!(
                f,
                "rejected {requested} byte request (chunk capacity {chunk_bytes})"
            ),
            Self::Released { chunks, bytes } => {
                write!(f, "released {chunks} chunks ({bytes} bytes)")
            }
        }
    }
}

/// Receives [`PoolEvent`]s from a pool.
///
/// Observers are called synchronously on the allocating thread, after the
/// pool has released its internal chain borrow, so an observer that calls
/// back into the same pool does not panic.
pub trait PoolObserver {
    /// Handle one event.
    fn on_event(&self, event: &PoolEvent);
}

impl<F> PoolObserver for F
where
    F: Fn(&PoolEvent),
{
    fn on_event(&self, event: &PoolEvent) {
        self(event)
    }
}

/// Forwards pool events to [`tracing`].
///
/// Chunk lifecycle events are logged at `DEBUG`, individual carves at
/// `TRACE`, and rejected requests at `WARN`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl PoolObserver for TracingObserver {
    fn on_event(&self, event: &PoolEvent) {
        match *event {
            PoolEvent::ChunkCreated { chunk, bytes } => {
                tracing::debug!(chunk, bytes, "allocated chunk");
            }
            PoolEvent::ChunkReused { chunk } => {
                tracing::debug!(chunk, "reusing chunk");
            }
            PoolEvent::Carved {
                chunk,
                offset,
                bytes,
            } => {
                tracing::trace!(chunk, offset, bytes, "carved bytes");
            }
            PoolEvent::Cleared { chunks } => {
                tracing::debug!(chunks, "cleared pool");
            }
            PoolEvent::OverCapacity {
                requested,
                chunk_bytes,
            } => {
                tracing::warn!(requested, chunk_bytes, "request exceeds chunk capacity");
            }
            PoolEvent::Released { chunks, bytes } => {
                tracing::debug!(chunks, bytes, "released pool storage");
            }
        }
    }
}
