//! Low-level primitives for chunk storage.
//!
//! This is the only module in the crate allowed to contain `unsafe` code.
//! Each `unsafe` block carries a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Owned, fixed-size, zero-initialised byte storage for one chunk.
///
/// Holds the allocation as a raw pointer rather than a `Box<[u8]>` so that
/// moving a `RawChunk` (e.g. when the chunk list grows) never asserts
/// uniqueness over bytes that callers already hold pointers into.
pub(crate) struct RawChunk {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl RawChunk {
    /// Allocate zeroed storage for `layout`.
    ///
    /// `layout.size()` must be non-zero; the pool config guarantees it.
    /// Allocation failure is fatal and reported through
    /// [`alloc::handle_alloc_error`].
    pub(crate) fn new(layout: Layout) -> Self {
        debug_assert!(layout.size() > 0);
        // SAFETY: `layout` has a non-zero size (validated by `PoolConfig`).
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        match NonNull::new(ptr) {
            Some(ptr) => Self { ptr, layout },
            None => alloc::handle_alloc_error(layout),
        }
    }

    /// Pointer `offset` bytes past the start of the storage.
    ///
    /// `offset` may equal the capacity (one-past-the-end, used for
    /// zero-length carves).
    pub(crate) fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        assert!(offset <= self.layout.size(), "offset past end of chunk");
        // SAFETY: `offset <= size`, so the result stays within (or one past
        // the end of) the single allocation `ptr` points to.
        unsafe { self.ptr.add(offset) }
    }

    /// Start address of the storage.
    pub(crate) fn base(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Capacity in bytes.
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for RawChunk {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by `alloc_zeroed` with exactly `layout`
        // and is released only here, once.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

/// Zero `len` bytes at `ptr` and hand them out as an exclusive slice.
///
/// # Safety
///
/// `ptr..ptr + len` must lie inside a live chunk, must not overlap any other
/// region handed out since the last reset, and must stay valid for `'a`.
pub(crate) unsafe fn zeroed_slice<'a>(ptr: NonNull<u8>, len: usize) -> &'a mut [u8] {
    // SAFETY: the caller guarantees the range is in bounds and unaliased;
    // zeroing first makes every byte initialised even if the range held
    // padding from a previous cycle.
    unsafe {
        ptr.as_ptr().write_bytes(0, len);
        std::slice::from_raw_parts_mut(ptr.as_ptr(), len)
    }
}
