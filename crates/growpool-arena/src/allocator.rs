//! Container allocator backed by a shared [`MemPool`].
//!
//! A [`PoolAllocator`] is a borrowed handle, not an owner: it holds
//! `&'a MemPool`, so the pool must outlive every allocator and every
//! container built on one, and the compiler enforces it. Handles are `Copy`;
//! copying, moving or rebinding one never touches pool ownership.
//!
//! Release is a no-op by contract. Storage handed out through any handle is
//! reclaimed only in bulk, by [`MemPool::clear`] or by dropping the pool.
//! Because no handle ever frees anything, any handle may "release" storage
//! obtained through any other, and all handles compare equal.

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use allocator_api2::alloc::{AllocError, Allocator};

use crate::error::ArenaError;
use crate::pool::MemPool;

/// Typed allocation handle over a [`MemPool`].
///
/// `T` fixes the element type for [`allocate`](Self::allocate) and
/// [`release`](Self::release); it does not restrict the
/// [`Allocator`] impl, which serves any layout. Use [`rebind`](Self::rebind)
/// to get a handle for another element type over the same pool.
///
/// ```
/// use allocator_api2::vec::Vec;
/// use growpool_arena::{MemPool, PoolAllocator};
///
/// let pool = MemPool::new(4096).unwrap();
/// let alloc = PoolAllocator::<i32>::new(&pool);
///
/// let mut v = Vec::new_in(alloc);
/// v.extend(0..100);
/// assert!(pool.contains(v.as_ptr()));
/// ```
pub struct PoolAllocator<'a, T = u8> {
    pool: &'a MemPool,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> PoolAllocator<'a, T> {
    /// Bind a handle to `pool`.
    pub fn new(pool: &'a MemPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// The pool this handle draws from.
    pub fn pool(&self) -> &'a MemPool {
        self.pool
    }

    /// Allocate uninitialised, aligned storage for `count` values of `T`.
    ///
    /// # Errors
    ///
    /// Propagates [`ArenaError::OverCapacityRequest`] unchanged when
    /// `count * size_of::<T>()` exceeds the pool's chunk size, and reports
    /// [`ArenaError::SizeOverflow`] when the byte size is not representable.
    pub fn allocate(&self, count: usize) -> Result<NonNull<T>, ArenaError> {
        let layout = Layout::array::<T>(count).map_err(|_| ArenaError::SizeOverflow {
            num_elements: count,
            element_bytes: std::mem::size_of::<T>(),
        })?;
        self.pool.allocate_layout(layout).map(NonNull::cast)
    }

    /// Release storage for `count` values at `ptr`.
    ///
    /// Does nothing: pool storage is only reclaimed in bulk. Calling this
    /// any number of times never changes what later allocations return.
    pub fn release(&self, ptr: NonNull<T>, count: usize) {
        let _ = (ptr, count);
    }

    /// A handle for element type `U` over the same pool.
    pub fn rebind<U>(&self) -> PoolAllocator<'a, U> {
        PoolAllocator::new(self.pool)
    }

    /// Whether both handles draw from the very same pool.
    ///
    /// Stricter than `==`, which is always `true`.
    pub fn same_pool<U>(&self, other: &PoolAllocator<'_, U>) -> bool {
        ptr::eq(self.pool, other.pool)
    }
}

impl<T> Clone for PoolAllocator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PoolAllocator<'_, T> {}

impl<'b, T, U> PartialEq<PoolAllocator<'b, U>> for PoolAllocator<'_, T> {
    /// Always `true`: release is a no-op, so storage from any handle may be
    /// released through any other.
    fn eq(&self, _other: &PoolAllocator<'b, U>) -> bool {
        true
    }
}

impl<T> Eq for PoolAllocator<'_, T> {}

impl<T> fmt::Debug for PoolAllocator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("element", &std::any::type_name::<T>())
            .field("pool", &ptr::from_ref(self.pool))
            .finish()
    }
}

// SAFETY: every block is carved from a chunk owned by the `'a` pool. Chunks
// are freed only when the pool drops and reset only through
// `MemPool::clear(&mut self)`; neither can happen while this handle (or any
// copy of it) holds `&'a MemPool`. Copies share the pool, so a block from
// one copy stays valid for all of them. Carves never overlap, and
// `allocate_layout` honours `layout.align()`.
#[allow(unsafe_code)]
unsafe impl<T> Allocator for PoolAllocator<'_, T> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = self.pool.allocate_layout(layout).map_err(|_| AllocError)?;
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}
