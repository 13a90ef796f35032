//! Fixed-capacity chunks and the chunk chain.
//!
//! A [`Chunk`] is a contiguous byte region with a bump counter. A
//! [`ChunkChain`] is the ordered list of chunks owned by one pool plus the
//! cursor naming the chunk currently being filled. Chunk `i + 1` is the
//! successor of chunk `i`; the chain only ever grows.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::ArenaError;
use crate::raw::RawChunk;

/// A single fixed-capacity chunk with bump allocation.
///
/// Chunks are never freed individually; their storage is released when the
/// owning chain is dropped.
pub(crate) struct Chunk {
    storage: RawChunk,
    /// Bump counter: bytes handed out from the start of the chunk.
    used: usize,
}

impl Chunk {
    fn new(layout: Layout) -> Self {
        Self {
            storage: RawChunk::new(layout),
            used: 0,
        }
    }

    /// Carve `len` bytes aligned to `align` from the unused tail.
    ///
    /// Returns the offset of the carved region, or `None` if the remaining
    /// space (after alignment padding) is too small.
    fn try_carve(&mut self, len: usize, align: usize) -> Option<usize> {
        let start = self.used.checked_next_multiple_of(align)?;
        let end = start.checked_add(len)?;
        if end > self.capacity() {
            return None;
        }
        self.used = end;
        Some(start)
    }

    /// Offset for a zero-length region aligned to `align`.
    ///
    /// Takes the aligned end of the used prefix when that is still inside
    /// the chunk, otherwise the base. Nothing is marked used.
    fn place_empty(&self, align: usize) -> usize {
        match self.used.checked_next_multiple_of(align) {
            Some(start) if start < self.capacity() => start,
            _ => 0,
        }
    }

    /// Restart this chunk with `len` bytes in use from offset 0.
    fn restart(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.used = len;
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }

    pub(crate) fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub(crate) fn base(&self) -> NonNull<u8> {
        self.storage.base()
    }

    /// Whether `addr` falls inside this chunk's storage.
    ///
    /// The end address is excluded. Carves never return it: zero-length
    /// regions are placed strictly inside the chunk.
    pub(crate) fn contains_addr(&self, addr: usize) -> bool {
        let start = self.base().as_ptr() as usize;
        addr >= start && addr < start + self.capacity()
    }
}

/// How a carve was satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Fitted in the tail of the cursor chunk.
    Current,
    /// Advanced the cursor to an existing successor and restarted it.
    Reused,
    /// Appended a brand-new chunk.
    Created,
}

/// Result of a successful carve.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Carve {
    pub(crate) ptr: NonNull<u8>,
    pub(crate) chunk: usize,
    pub(crate) offset: usize,
    pub(crate) placement: Placement,
}

/// The chain of chunks owned by a pool, with its fill cursor.
pub(crate) struct ChunkChain {
    chunks: Vec<Chunk>,
    layout: Layout,
    /// Index of the chunk currently being filled. Always `< chunks.len()`.
    current: usize,
}

impl ChunkChain {
    /// Create a chain with one eagerly allocated chunk of `layout`.
    pub(crate) fn new(layout: Layout) -> Self {
        Self {
            chunks: vec![Chunk::new(layout)],
            layout,
            current: 0,
        }
    }

    /// Carve `len` bytes aligned to `align`, advancing or growing the chain
    /// if the cursor chunk cannot hold them.
    ///
    /// Zero-length requests always land inside the cursor chunk and never
    /// move the cursor.
    ///
    /// `align` must be a power of two no larger than the chunk alignment.
    pub(crate) fn carve(&mut self, len: usize, align: usize) -> Result<Carve, ArenaError> {
        // Reject requests that can never fit in a single chunk.
        if len > self.chunk_bytes() {
            return Err(ArenaError::OverCapacityRequest {
                requested: len,
                chunk_bytes: self.chunk_bytes(),
            });
        }

        // Try the cursor chunk first.
        let chunk = &mut self.chunks[self.current];
        if len == 0 {
            let offset = chunk.place_empty(align);
            return Ok(Carve {
                ptr: chunk.storage.ptr_at(offset),
                chunk: self.current,
                offset,
                placement: Placement::Current,
            });
        }
        if let Some(offset) = chunk.try_carve(len, align) {
            return Ok(Carve {
                ptr: chunk.storage.ptr_at(offset),
                chunk: self.current,
                offset,
                placement: Placement::Current,
            });
        }

        // Cursor chunk is full: move to its successor, creating one if needed.
        let next = self.current + 1;
        let placement = if next < self.chunks.len() {
            Placement::Reused
        } else {
            self.chunks.push(Chunk::new(self.layout));
            Placement::Created
        };
        self.current = next;
        // Offset 0 of any chunk satisfies `align` and `len <= chunk_bytes`.
        let chunk = &mut self.chunks[next];
        chunk.restart(len);
        Ok(Carve {
            ptr: chunk.base(),
            chunk: next,
            offset: 0,
            placement,
        })
    }

    /// Reset every chunk's bump counter and return the cursor to the head.
    ///
    /// Storage is kept; later allocations walk the existing chunks before
    /// creating new ones.
    pub(crate) fn reset(&mut self) {
        for chunk in &mut self.chunks {
            chunk.used = 0;
        }
        self.current = 0;
    }

    pub(crate) fn chunk_bytes(&self) -> usize {
        self.layout.size()
    }

    pub(crate) fn len(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn current(&self) -> usize {
        self.current
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    /// Bytes in use across all chunks, including alignment padding.
    pub(crate) fn total_used(&self) -> usize {
        self.chunks.iter().map(Chunk::used).sum()
    }

    /// Index of the chunk whose storage contains `addr`.
    pub(crate) fn position_of(&self, addr: usize) -> Option<usize> {
        self.chunks.iter().position(|c| c.contains_addr(addr))
    }
}
