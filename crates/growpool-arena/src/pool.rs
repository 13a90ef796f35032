//! The chunked memory pool.
//!
//! [`MemPool`] serves every request by bumping a counter in the chunk under
//! its cursor. When that chunk cannot hold a request, the cursor moves to
//! the next chunk in the chain (restarting it from offset 0), and a new
//! chunk is appended only when the cursor is already at the end of the
//! chain. A small tail of each chunk may be abandoned at a transition; in
//! exchange, allocation is O(1) with no free-list search.
//!
//! Allocation takes `&self`, so any number of [`PoolAllocator`]s and
//! containers can share one pool. [`MemPool::clear`] takes `&mut self`, so
//! the borrow checker rejects a clear while anything still borrows the pool.
//!
//! [`PoolAllocator`]: crate::PoolAllocator

use std::alloc::Layout;
use std::cell::RefCell;
use std::fmt;
use std::ptr::NonNull;

use crate::chunk::{Carve, ChunkChain, Placement};
use crate::config::{PoolConfig, CHUNK_ALIGN};
use crate::error::ArenaError;
use crate::observer::{PoolEvent, PoolObserver};
use crate::raw;

/// A bump-pointer arena built from a chain of fixed-capacity chunks.
///
/// Individual allocations are never freed. Memory is reused collectively
/// through [`clear`](Self::clear) and released when the pool is dropped.
///
/// The pool is not thread-safe and is `!Sync`; share it by reference on one
/// thread.
///
/// ```
/// use growpool_arena::MemPool;
///
/// let pool = MemPool::new(64).unwrap();
/// let a = pool.allocate(40, 1).unwrap();
/// let b = pool.allocate(40, 1).unwrap(); // 24 bytes left: moves to a new chunk
/// assert_eq!(pool.chunk_count(), 2);
/// assert_ne!(pool.chunk_index_of(a.as_ptr()), pool.chunk_index_of(b.as_ptr()));
/// assert!(pool.allocate(65, 1).is_err());
/// ```
pub struct MemPool {
    chain: RefCell<ChunkChain>,
    observer: Option<Box<dyn PoolObserver>>,
}

impl MemPool {
    /// Create a pool whose chunks each hold `chunk_bytes` bytes.
    ///
    /// The first chunk is allocated immediately.
    pub fn new(chunk_bytes: usize) -> Result<Self, ArenaError> {
        Self::from_config(PoolConfig::new(chunk_bytes))
    }

    /// Create a pool from a validated config.
    pub fn from_config(config: PoolConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let layout = Layout::from_size_align(config.chunk_bytes, CHUNK_ALIGN).map_err(|_| {
            ArenaError::InvalidConfig {
                reason: "chunk_bytes exceeds the maximum allocation size",
            }
        })?;
        Ok(Self {
            chain: RefCell::new(ChunkChain::new(layout)),
            observer: None,
        })
    }

    /// Install a diagnostics observer.
    ///
    /// The head chunk is allocated during construction, before the observer
    /// exists, so the first event an observer can see concerns chunk 1 or a
    /// carve.
    pub fn with_observer(mut self, observer: impl PoolObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Allocate storage for `num_elements` values of `element_bytes` each.
    ///
    /// The region is carved with no alignment padding, directly after the
    /// previous allocation in the cursor chunk. Use
    /// [`allocate_layout`](Self::allocate_layout) when the region must be
    /// aligned for a type.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::OverCapacityRequest`] if the total exceeds
    ///   [`chunk_bytes`](Self::chunk_bytes).
    /// - [`ArenaError::SizeOverflow`] if the total does not fit in `usize`.
    ///
    /// Nothing is marked used when an error is returned.
    pub fn allocate(
        &self,
        num_elements: usize,
        element_bytes: usize,
    ) -> Result<NonNull<u8>, ArenaError> {
        let requested =
            num_elements
                .checked_mul(element_bytes)
                .ok_or(ArenaError::SizeOverflow {
                    num_elements,
                    element_bytes,
                })?;
        self.carve(requested, 1)
    }

    /// Allocate a region of `layout.size()` bytes aligned to `layout.align()`.
    ///
    /// Alignment padding inside the cursor chunk counts as used. Alignments
    /// up to [`CHUNK_ALIGN`] are supported.
    pub fn allocate_layout(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        if layout.align() > CHUNK_ALIGN {
            return Err(ArenaError::UnsupportedAlignment {
                align: layout.align(),
                max_align: CHUNK_ALIGN,
            });
        }
        self.carve(layout.size(), layout.align())
    }

    /// Allocate `len` zeroed bytes as an exclusive slice.
    ///
    /// The slice borrows the pool, so it cannot outlive the pool or survive
    /// a [`clear`](Self::clear).
    #[allow(unsafe_code, clippy::mut_from_ref)]
    pub fn alloc_bytes(&self, len: usize) -> Result<&mut [u8], ArenaError> {
        let ptr = self.carve(len, 1)?;
        // SAFETY: `carve` returned `len` in-bounds bytes no other allocation
        // overlaps. The chunk lives as long as `self`, and clearing it needs
        // `&mut self`, which cannot coexist with the returned borrow.
        Ok(unsafe { raw::zeroed_slice(ptr, len) })
    }

    /// Make all chunk storage available again.
    ///
    /// Every chunk's usage counter is reset and the cursor returns to the
    /// head chunk. Chunks are kept: subsequent allocations refill the head,
    /// then walk the existing chain before any new chunk is created.
    pub fn clear(&mut self) {
        let chain = self.chain.get_mut();
        chain.reset();
        let chunks = chain.len();
        self.notify(|| PoolEvent::Cleared { chunks });
    }

    /// Capacity of every chunk in bytes; also the largest servable request.
    pub fn chunk_bytes(&self) -> usize {
        self.chain.borrow().chunk_bytes()
    }

    /// Number of chunks in the chain.
    pub fn chunk_count(&self) -> usize {
        self.chain.borrow().len()
    }

    /// Position of the chunk the cursor points at.
    pub fn current_chunk(&self) -> usize {
        self.chain.borrow().current()
    }

    /// Bytes marked used across all chunks, including alignment padding.
    pub fn used_bytes(&self) -> usize {
        self.chain.borrow().total_used()
    }

    /// Bytes marked used in chunk `index`, or `None` past the end of the chain.
    pub fn chunk_used(&self, index: usize) -> Option<usize> {
        self.chain.borrow().get(index).map(|c| c.used())
    }

    /// Start address of chunk `index`, or `None` past the end of the chain.
    pub fn chunk_base(&self, index: usize) -> Option<NonNull<u8>> {
        self.chain.borrow().get(index).map(|c| c.base())
    }

    /// Total capacity owned by the pool in bytes.
    pub fn memory_bytes(&self) -> usize {
        let chain = self.chain.borrow();
        chain.len() * chain.chunk_bytes()
    }

    /// Position of the chunk whose storage contains `ptr`.
    pub fn chunk_index_of<T: ?Sized>(&self, ptr: *const T) -> Option<usize> {
        self.chain.borrow().position_of(ptr.cast::<u8>().addr())
    }

    /// Whether `ptr` points into storage owned by this pool.
    pub fn contains<T: ?Sized>(&self, ptr: *const T) -> bool {
        self.chunk_index_of(ptr).is_some()
    }

    fn carve(&self, len: usize, align: usize) -> Result<NonNull<u8>, ArenaError> {
        let result = self.chain.borrow_mut().carve(len, align);
        match result {
            Ok(carve) => {
                self.report_carve(&carve, len);
                Ok(carve.ptr)
            }
            Err(err) => {
                if let ArenaError::OverCapacityRequest {
                    requested,
                    chunk_bytes,
                } = err
                {
                    self.notify(|| PoolEvent::OverCapacity {
                        requested,
                        chunk_bytes,
                    });
                }
                Err(err)
            }
        }
    }

    fn report_carve(&self, carve: &Carve, len: usize) {
        let Some(observer) = &self.observer else {
            return;
        };
        match carve.placement {
            Placement::Current => {}
            Placement::Reused => observer.on_event(&PoolEvent::ChunkReused { chunk: carve.chunk }),
            Placement::Created => observer.on_event(&PoolEvent::ChunkCreated {
                chunk: carve.chunk,
                bytes: self.chunk_bytes(),
            }),
        }
        observer.on_event(&PoolEvent::Carved {
            chunk: carve.chunk,
            offset: carve.offset,
            bytes: len,
        });
    }

    fn notify(&self, event: impl FnOnce() -> PoolEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event());
        }
    }
}

impl Drop for MemPool {
    fn drop(&mut self) {
        let chunks = self.chunk_count();
        let bytes = self.memory_bytes();
        self.notify(|| PoolEvent::Released { chunks, bytes });
    }
}

impl fmt::Debug for MemPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.chain.borrow();
        f.debug_struct("MemPool")
            .field("chunk_bytes", &chain.chunk_bytes())
            .field("chunks", &chain.len())
            .field("current", &chain.current())
            .field("used_bytes", &chain.total_used())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recording_pool(chunk_bytes: usize) -> (MemPool, Rc<RefCell<Vec<PoolEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let pool = MemPool::new(chunk_bytes)
            .unwrap()
            .with_observer(move |e: &PoolEvent| sink.borrow_mut().push(e.clone()));
        (pool, events)
    }

    fn offset_in(pool: &MemPool, ptr: NonNull<u8>) -> (usize, usize) {
        let chunk = pool.chunk_index_of(ptr.as_ptr()).unwrap();
        let base = pool.chunk_base(chunk).unwrap();
        (chunk, ptr.as_ptr() as usize - base.as_ptr() as usize)
    }

    #[test]
    fn construction_allocates_head_chunk() {
        let pool = MemPool::new(128).unwrap();
        assert_eq!(pool.chunk_count(), 1);
        assert_eq!(pool.current_chunk(), 0);
        assert_eq!(pool.used_bytes(), 0);
        assert_eq!(pool.memory_bytes(), 128);
    }

    #[test]
    fn zero_chunk_bytes_rejected() {
        assert!(matches!(
            MemPool::new(0),
            Err(ArenaError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn sixty_four_byte_scenario() {
        let pool = MemPool::new(64).unwrap();

        let a = pool.allocate(40, 1).unwrap();
        assert_eq!(offset_in(&pool, a), (0, 0));

        // 64 - 40 = 24 < 40: second chunk.
        let b = pool.allocate(40, 1).unwrap();
        assert_eq!(offset_in(&pool, b), (1, 0));

        // Exactly one full chunk: third chunk.
        let c = pool.allocate(64, 1).unwrap();
        assert_eq!(offset_in(&pool, c), (2, 0));
        assert_eq!(pool.chunk_count(), 3);

        let err = pool.allocate(65, 1).unwrap_err();
        assert_eq!(
            err,
            ArenaError::OverCapacityRequest {
                requested: 65,
                chunk_bytes: 64
            }
        );
        assert_eq!(pool.chunk_count(), 3);
    }

    #[test]
    fn full_chunk_then_one_byte_moves_on() {
        let pool = MemPool::new(32).unwrap();
        pool.allocate(32, 1).unwrap();
        let next = pool.allocate(1, 1).unwrap();
        assert_eq!(offset_in(&pool, next), (1, 0));
    }

    #[test]
    fn element_count_times_size() {
        let pool = MemPool::new(64).unwrap();
        let a = pool.allocate(3, 4).unwrap();
        let b = pool.allocate(2, 8).unwrap();
        assert_eq!(offset_in(&pool, a), (0, 0));
        assert_eq!(offset_in(&pool, b), (0, 12));
        assert_eq!(pool.used_bytes(), 28);
    }

    #[test]
    fn over_capacity_regardless_of_state() {
        let pool = MemPool::new(16).unwrap();
        assert!(pool.allocate(17, 1).is_err());
        pool.allocate(10, 1).unwrap();
        assert!(pool.allocate(2, 9).is_err());
        assert_eq!(pool.used_bytes(), 10);
    }

    #[test]
    fn size_overflow_is_reported() {
        let pool = MemPool::new(16).unwrap();
        let err = pool.allocate(usize::MAX, 2).unwrap_err();
        assert_eq!(
            err,
            ArenaError::SizeOverflow {
                num_elements: usize::MAX,
                element_bytes: 2
            }
        );
    }

    #[test]
    fn zero_byte_request_does_not_consume() {
        let pool = MemPool::new(16).unwrap();
        pool.allocate(0, 8).unwrap();
        pool.allocate(5, 0).unwrap();
        assert_eq!(pool.used_bytes(), 0);
        assert_eq!(pool.chunk_count(), 1);
    }

    #[test]
    fn zero_byte_aligned_request_on_full_chunk_stays_put() {
        let pool = MemPool::new(13).unwrap();
        pool.allocate(13, 1).unwrap();

        let empty = pool.allocate_layout(Layout::new::<[u64; 0]>()).unwrap();
        assert_eq!(empty.as_ptr() as usize % 8, 0);
        assert!(pool.contains(empty.as_ptr()));
        assert_eq!(pool.chunk_count(), 1);
        assert_eq!(pool.current_chunk(), 0);
        assert_eq!(pool.used_bytes(), 13);

        // The next real request still moves on as usual.
        pool.allocate(1, 1).unwrap();
        assert_eq!(pool.chunk_count(), 2);
    }

    #[test]
    fn observer_may_query_its_own_pool() {
        let slot: Rc<std::cell::OnceCell<&'static MemPool>> = Rc::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (reader, sink) = (Rc::clone(&slot), Rc::clone(&seen));
        let pool: &'static MemPool = Box::leak(Box::new(
            MemPool::new(16)
                .unwrap()
                .with_observer(move |_: &PoolEvent| {
                    if let Some(pool) = reader.get() {
                        sink.borrow_mut().push(pool.used_bytes());
                    }
                }),
        ));
        slot.set(pool).unwrap();

        pool.allocate(10, 1).unwrap();
        pool.allocate(10, 1).unwrap();
        // Carved, then ChunkCreated + Carved.
        assert_eq!(*seen.borrow(), vec![10, 20, 20]);
    }

    #[test]
    fn clear_reuses_head_base_address() {
        let mut pool = MemPool::new(64).unwrap();
        let head = pool.chunk_base(0).unwrap();
        pool.allocate(40, 1).unwrap();
        pool.allocate(40, 1).unwrap();

        pool.clear();
        let full = pool.allocate(64, 1).unwrap();
        assert_eq!(full, head);
        assert_eq!(pool.chunk_count(), 2);
    }

    #[test]
    fn clear_resets_every_chunk() {
        let mut pool = MemPool::new(64).unwrap();
        for _ in 0..3 {
            pool.allocate(50, 1).unwrap();
        }
        pool.clear();
        assert_eq!(pool.used_bytes(), 0);
        assert_eq!(pool.current_chunk(), 0);
        for i in 0..3 {
            assert_eq!(pool.chunk_used(i), Some(0));
        }
    }

    #[test]
    fn clear_walks_existing_chain_before_growing() {
        let mut pool = MemPool::new(64).unwrap();
        for _ in 0..3 {
            pool.allocate(64, 1).unwrap();
        }
        let bases: Vec<_> = (0..3).map(|i| pool.chunk_base(i).unwrap()).collect();

        pool.clear();
        for base in &bases {
            assert_eq!(pool.allocate(64, 1).unwrap(), *base);
        }
        assert_eq!(pool.chunk_count(), 3);
        pool.allocate(1, 1).unwrap();
        assert_eq!(pool.chunk_count(), 4);
    }

    #[test]
    fn small_request_after_reuse_stays_in_reused_chunk() {
        let mut pool = MemPool::new(64).unwrap();
        pool.allocate(64, 1).unwrap();
        pool.allocate(10, 1).unwrap();
        pool.clear();

        pool.allocate(60, 1).unwrap();
        let b = pool.allocate(20, 1).unwrap();
        let c = pool.allocate(20, 1).unwrap();
        assert_eq!(offset_in(&pool, b), (1, 0));
        assert_eq!(offset_in(&pool, c), (1, 20));
        assert_eq!(pool.chunk_used(1), Some(40));
    }

    #[test]
    fn allocate_layout_aligns() {
        let pool = MemPool::new(64).unwrap();
        pool.allocate(1, 1).unwrap();
        let p = pool.allocate_layout(Layout::new::<u64>()).unwrap();
        assert_eq!(p.as_ptr() as usize % std::mem::align_of::<u64>(), 0);
        assert_eq!(offset_in(&pool, p), (0, 8));
        assert_eq!(pool.used_bytes(), 16);
    }

    #[test]
    fn allocate_layout_rejects_huge_alignment() {
        let pool = MemPool::new(64).unwrap();
        let layout = Layout::from_size_align(8, 64).unwrap();
        assert_eq!(
            pool.allocate_layout(layout).unwrap_err(),
            ArenaError::UnsupportedAlignment {
                align: 64,
                max_align: CHUNK_ALIGN
            }
        );
    }

    #[test]
    fn alloc_bytes_is_zeroed_and_writable() {
        let mut pool = MemPool::new(32).unwrap();
        {
            let bytes = pool.alloc_bytes(32).unwrap();
            bytes.fill(0xAB);
        }
        pool.clear();
        let again = pool.alloc_bytes(32).unwrap();
        assert!(again.iter().all(|&b| b == 0));
    }

    #[test]
    fn contains_only_own_storage() {
        let pool = MemPool::new(32).unwrap();
        let other = MemPool::new(32).unwrap();
        let p = pool.allocate(8, 1).unwrap();
        assert!(pool.contains(p.as_ptr()));
        assert!(!other.contains(p.as_ptr()));
        let local = 0u8;
        assert!(!pool.contains(&local as *const u8));
    }

    #[test]
    fn observer_sees_chunk_lifecycle() {
        let (mut pool, events) = recording_pool(64);
        pool.allocate(40, 1).unwrap();
        pool.allocate(40, 1).unwrap();
        let _ = pool.allocate(65, 1);
        pool.clear();
        pool.allocate(64, 1).unwrap();
        pool.allocate(8, 1).unwrap();

        assert_eq!(
            *events.borrow(),
            vec![
                PoolEvent::Carved {
                    chunk: 0,
                    offset: 0,
                    bytes: 40
                },
                PoolEvent::ChunkCreated {
                    chunk: 1,
                    bytes: 64
                },
                PoolEvent::Carved {
                    chunk: 1,
                    offset: 0,
                    bytes: 40
                },
                PoolEvent::OverCapacity {
                    requested: 65,
                    chunk_bytes: 64
                },
                PoolEvent::Cleared { chunks: 2 },
                PoolEvent::Carved {
                    chunk: 0,
                    offset: 0,
                    bytes: 64
                },
                PoolEvent::ChunkReused { chunk: 1 },
                PoolEvent::Carved {
                    chunk: 1,
                    offset: 0,
                    bytes: 8
                },
            ]
        );

        drop(pool);
        assert_eq!(
            events.borrow().last(),
            Some(&PoolEvent::Released {
                chunks: 2,
                bytes: 128
            })
        );
    }

    #[test]
    fn debug_reports_chain_state() {
        let pool = MemPool::new(16).unwrap();
        pool.allocate(4, 1).unwrap();
        let text = format!("{pool:?}");
        assert!(text.contains("chunk_bytes: 16"));
        assert!(text.contains("used_bytes: 4"));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn regions_never_overlap(
                chunk_bytes in 1usize..256,
                sizes in proptest::collection::vec(0usize..300, 1..64),
            ) {
                let pool = MemPool::new(chunk_bytes).unwrap();
                let mut regions: Vec<(usize, usize)> = Vec::new();
                for len in sizes {
                    match pool.alloc_bytes(len) {
                        Ok(bytes) => {
                            prop_assert!(len <= chunk_bytes);
                            bytes.fill(0xFF);
                            regions.push((bytes.as_ptr() as usize, len));
                        }
                        Err(err) => {
                            prop_assert!(len > chunk_bytes);
                            let is_over_capacity =
                                matches!(err, ArenaError::OverCapacityRequest { .. });
                            prop_assert!(is_over_capacity);
                        }
                    }
                }
                let mut sorted: Vec<_> = regions.into_iter().filter(|r| r.1 > 0).collect();
                sorted.sort_unstable();
                for pair in sorted.windows(2) {
                    prop_assert!(pair[0].0 + pair[0].1 <= pair[1].0);
                }
            }

            #[test]
            fn every_chunk_within_capacity(
                chunk_bytes in 1usize..128,
                sizes in proptest::collection::vec(0usize..128, 1..64),
            ) {
                let pool = MemPool::new(chunk_bytes).unwrap();
                for len in sizes {
                    let _ = pool.allocate(len, 1);
                }
                for i in 0..pool.chunk_count() {
                    prop_assert!(pool.chunk_used(i).unwrap() <= chunk_bytes);
                }
                prop_assert!(pool.current_chunk() < pool.chunk_count());
            }

            #[test]
            fn clear_replays_same_addresses(
                sizes in proptest::collection::vec(1usize..64, 1..32),
            ) {
                let mut pool = MemPool::new(64).unwrap();
                let first: Vec<_> = sizes.iter().map(|&n| pool.allocate(n, 1).unwrap()).collect();
                let chunks = pool.chunk_count();
                pool.clear();
                let second: Vec<_> = sizes.iter().map(|&n| pool.allocate(n, 1).unwrap()).collect();
                prop_assert_eq!(first, second);
                prop_assert_eq!(pool.chunk_count(), chunks);
            }
        }
    }
}
