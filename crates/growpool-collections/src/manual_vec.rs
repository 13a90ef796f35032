//! A vector whose capacity is controlled explicitly by the caller.

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use allocator_api2::alloc::{Allocator, Global};

use crate::error::{PushError, VecError};

/// Contiguous, allocator-backed storage whose capacity only changes on
/// [`realloc`](Self::realloc).
///
/// Length and capacity are independent: [`resize`](Self::resize) and
/// [`push`](Self::push) work within the current capacity and fail instead
/// of growing it.
///
/// ```
/// use growpool_collections::{ManualCapacityVec, VecError};
///
/// let mut v = ManualCapacityVec::<u32>::with_capacity(2).unwrap();
/// v.push(1).unwrap();
/// v.push(2).unwrap();
/// assert!(v.push(3).is_err());
///
/// v.realloc(4).unwrap();
/// v.push(3).unwrap();
/// assert_eq!(&v[..], &[1, 2, 3]);
/// assert_eq!(v.resize(5), Err(VecError::LenExceedsCapacity { len: 5, capacity: 4 }));
/// ```
pub struct ManualCapacityVec<T, A: Allocator = Global> {
    ptr: NonNull<T>,
    len: usize,
    capacity: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

// SAFETY: the vector owns its elements and its buffer exclusively, like
// `Vec<T, A>`.
unsafe impl<T: Send, A: Allocator + Send> Send for ManualCapacityVec<T, A> {}
// SAFETY: shared access only hands out `&T` and `&A`.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for ManualCapacityVec<T, A> {}

impl<T> ManualCapacityVec<T> {
    /// Create an empty vector on the global allocator.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Create an empty vector with room for `capacity` elements on the
    /// global allocator.
    pub fn with_capacity(capacity: usize) -> Result<Self, VecError> {
        Self::with_capacity_in(capacity, Global)
    }
}

impl<T> Default for ManualCapacityVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> ManualCapacityVec<T, A> {
    /// Create an empty vector with zero capacity. Does not allocate.
    pub fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            capacity: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Create an empty vector with room for exactly `capacity` elements.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, VecError> {
        let ptr = allocate_buffer::<T, A>(&alloc, capacity)?;
        Ok(Self {
            ptr,
            len: 0,
            capacity,
            alloc,
            _marker: PhantomData,
        })
    }

    /// Create a vector of `len` default values; capacity equals `len`.
    pub fn with_len_in(len: usize, alloc: A) -> Result<Self, VecError>
    where
        T: Default,
    {
        let mut v = Self::with_capacity_in(len, alloc)?;
        v.fill_to(len, T::default);
        Ok(v)
    }

    /// Create a vector of `len` clones of `value`; capacity equals `len`.
    pub fn from_elem_in(len: usize, value: T, alloc: A) -> Result<Self, VecError>
    where
        T: Clone,
    {
        let mut v = Self::with_capacity_in(len, alloc)?;
        v.fill_to(len, || value.clone());
        Ok(v)
    }

    /// Move the elements into a new buffer of exactly `new_capacity`.
    ///
    /// Does nothing when `new_capacity` equals the current capacity. The
    /// old buffer is returned to the allocator.
    ///
    /// # Errors
    ///
    /// [`VecError::CapacityBelowLen`] if `new_capacity < len`; allocation
    /// errors leave the vector unchanged.
    pub fn realloc(&mut self, new_capacity: usize) -> Result<(), VecError> {
        if new_capacity < self.len {
            return Err(VecError::CapacityBelowLen {
                capacity: new_capacity,
                len: self.len,
            });
        }
        if new_capacity == self.capacity {
            return Ok(());
        }
        let new_ptr = allocate_buffer::<T, A>(&self.alloc, new_capacity)?;
        // SAFETY: both buffers hold at least `len` elements and are distinct
        // allocations. The moved-from slots are never read again: the old
        // buffer is released right after without dropping its contents.
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len);
            release_buffer(&self.alloc, self.ptr, self.capacity);
        }
        self.ptr = new_ptr;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Change the length, filling new slots with `T::default()`.
    ///
    /// Never reallocates.
    ///
    /// # Errors
    ///
    /// [`VecError::LenExceedsCapacity`] if `new_len > capacity`.
    pub fn resize(&mut self, new_len: usize) -> Result<(), VecError>
    where
        T: Default,
    {
        self.check_len(new_len)?;
        self.truncate(new_len);
        self.fill_to(new_len, T::default);
        Ok(())
    }

    /// Change the length without checking it against capacity, filling new
    /// slots with `T::default()`.
    ///
    /// # Safety
    ///
    /// `new_len` must not exceed `capacity()`.
    pub unsafe fn resize_unchecked(&mut self, new_len: usize)
    where
        T: Default,
    {
        debug_assert!(new_len <= self.capacity);
        self.truncate(new_len);
        self.fill_to(new_len, T::default);
    }

    /// Change the length, filling new slots with clones of `value`.
    ///
    /// Never reallocates.
    ///
    /// # Errors
    ///
    /// [`VecError::LenExceedsCapacity`] if `new_len > capacity`.
    pub fn resize_with_value(&mut self, new_len: usize, value: T) -> Result<(), VecError>
    where
        T: Clone,
    {
        self.check_len(new_len)?;
        self.truncate(new_len);
        self.fill_to(new_len, || value.clone());
        Ok(())
    }

    /// Drop elements past `new_len`. Does nothing if `new_len >= len`.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let tail = ptr::slice_from_raw_parts_mut(
            // SAFETY: `new_len < len <= capacity`.
            unsafe { self.ptr.as_ptr().add(new_len) },
            self.len - new_len,
        );
        // Shorten first so a panicking destructor cannot cause a double drop.
        self.len = new_len;
        // SAFETY: the tail elements are initialised and now outside `len`.
        unsafe { ptr::drop_in_place(tail) };
    }

    /// Append `value` if there is spare capacity.
    ///
    /// # Errors
    ///
    /// Hands `value` back in a [`PushError`] when `len == capacity`.
    pub fn push(&mut self, value: T) -> Result<(), PushError<T>> {
        if self.len == self.capacity {
            return Err(PushError {
                value,
                capacity: self.capacity,
            });
        }
        // SAFETY: `len < capacity` was just checked.
        unsafe { self.push_unchecked(value) };
        Ok(())
    }

    /// Append `value` without checking capacity.
    ///
    /// # Safety
    ///
    /// `len()` must be less than `capacity()`.
    pub unsafe fn push_unchecked(&mut self, value: T) {
        debug_assert!(self.len < self.capacity);
        // SAFETY: the caller guarantees slot `len` is inside the buffer.
        unsafe { self.ptr.as_ptr().add(self.len).write(value) };
        self.len += 1;
    }

    /// Number of initialised elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the current buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pointer to the buffer. Dangling while the capacity is zero.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Mutable pointer to the buffer. Dangling while the capacity is zero.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// The initialised elements.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are initialised; `ptr` is non-null and
        // aligned even when dangling.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The initialised elements, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`, and `&mut self` makes the access unique.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// The allocator backing this vector.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    fn check_len(&self, new_len: usize) -> Result<(), VecError> {
        if new_len > self.capacity {
            return Err(VecError::LenExceedsCapacity {
                len: new_len,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Push values from `make` until `len == target`. `target <= capacity`.
    fn fill_to(&mut self, target: usize, mut make: impl FnMut() -> T) {
        debug_assert!(target <= self.capacity);
        while self.len < target {
            // SAFETY: `len < target <= capacity`.
            unsafe { self.push_unchecked(make()) };
        }
    }
}

fn allocate_buffer<T, A: Allocator>(alloc: &A, capacity: usize) -> Result<NonNull<T>, VecError> {
    let layout = Layout::array::<T>(capacity).map_err(|_| VecError::CapacityOverflow)?;
    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }
    let block = alloc.allocate(layout).map_err(|_| VecError::Alloc)?;
    Ok(block.cast())
}

/// Return a buffer obtained from [`allocate_buffer`] to `alloc`.
///
/// # Safety
///
/// `ptr` must come from `allocate_buffer(alloc, capacity)` and must not be
/// used afterwards.
unsafe fn release_buffer<T, A: Allocator>(alloc: &A, ptr: NonNull<T>, capacity: usize) {
    let Ok(layout) = Layout::array::<T>(capacity) else {
        return;
    };
    if layout.size() != 0 {
        // SAFETY: the caller guarantees `ptr` was allocated by `alloc` with
        // this layout.
        unsafe { alloc.deallocate(ptr.cast(), layout) };
    }
}

impl<T, A: Allocator> Drop for ManualCapacityVec<T, A> {
    fn drop(&mut self) {
        self.truncate(0);
        // SAFETY: `ptr` came from `allocate_buffer` with `capacity` and the
        // vector is being destroyed.
        unsafe { release_buffer(&self.alloc, self.ptr, self.capacity) };
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for ManualCapacityVec<T, A> {
    /// Clone into a buffer of the same capacity from a clone of the allocator.
    fn clone(&self) -> Self {
        let mut out = match Self::with_capacity_in(self.capacity, self.alloc.clone()) {
            Ok(out) => out,
            Err(_) => {
                let layout = Layout::array::<T>(self.capacity).unwrap_or(Layout::new::<T>());
                std::alloc::handle_alloc_error(layout)
            }
        };
        for item in self.as_slice() {
            // SAFETY: `out.capacity == self.capacity >= self.len`.
            unsafe { out.push_unchecked(item.clone()) };
        }
        out
    }
}

impl<T, A: Allocator> Deref for ManualCapacityVec<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator> DerefMut for ManualCapacityVec<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a ManualCapacityVec<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut ManualCapacityVec<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<ManualCapacityVec<T, B>>
    for ManualCapacityVec<T, A>
{
    fn eq(&self, other: &ManualCapacityVec<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for ManualCapacityVec<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
