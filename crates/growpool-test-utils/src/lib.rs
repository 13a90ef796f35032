//! Test fixtures and assertions for growpool development.
//!
//! Provides a [`RecordingObserver`] that captures pool events for later
//! inspection, and region helpers for checking that pool allocations are
//! disjoint and live inside the pool that served them.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::cell::RefCell;
use std::rc::Rc;

use growpool_arena::{MemPool, PoolEvent, PoolObserver};

/// Observer that records every event it receives.
///
/// Clones share one log, so keep a clone after handing the observer to
/// [`MemPool::with_observer`].
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Rc<RefCell<Vec<PoolEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far.
    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.borrow().clone()
    }

    /// Number of `ChunkCreated` events recorded.
    pub fn chunks_created(&self) -> usize {
        self.count(|e| matches!(e, PoolEvent::ChunkCreated { .. }))
    }

    /// Number of `ChunkReused` events recorded.
    pub fn chunks_reused(&self) -> usize {
        self.count(|e| matches!(e, PoolEvent::ChunkReused { .. }))
    }

    pub fn count(&self, pred: impl Fn(&PoolEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl PoolObserver for RecordingObserver {
    fn on_event(&self, event: &PoolEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Build a pool with a [`RecordingObserver`] attached.
///
/// # Panics
///
/// Panics if `chunk_bytes` is zero.
pub fn recording_pool(chunk_bytes: usize) -> (MemPool, RecordingObserver) {
    let observer = RecordingObserver::new();
    let pool = MemPool::new(chunk_bytes)
        .expect("test pool config must be valid")
        .with_observer(observer.clone());
    (pool, observer)
}

/// A byte range handed out by a pool, as `(start address, length)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Region {
    pub start: usize,
    pub len: usize,
}

impl Region {
    pub fn new<T: ?Sized>(ptr: *const T, len: usize) -> Self {
        Self {
            start: ptr.cast::<u8>().addr(),
            len,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.len > 0 && other.len > 0 && self.start < other.end() && other.start < self.end()
    }
}

/// Assert no two non-empty regions share a byte.
///
/// # Panics
///
/// Panics naming the first overlapping pair.
pub fn assert_disjoint(regions: &[Region]) {
    let mut sorted: Vec<Region> = regions.iter().copied().filter(|r| r.len > 0).collect();
    sorted.sort_unstable();
    for pair in sorted.windows(2) {
        assert!(
            !pair[0].overlaps(&pair[1]),
            "regions overlap: {:?} and {:?}",
            pair[0],
            pair[1]
        );
    }
}

/// Assert every byte of `region` lies inside a single chunk of `pool`.
///
/// # Panics
///
/// Panics if the region starts outside the pool or runs past the end of
/// the chunk it starts in.
pub fn assert_within_pool(pool: &MemPool, region: Region) {
    let chunk = pool
        .chunk_index_of(std::ptr::without_provenance::<u8>(region.start))
        .unwrap_or_else(|| panic!("{region:?} is not inside the pool"));
    let base = pool
        .chunk_base(chunk)
        .expect("chunk index came from the pool")
        .as_ptr()
        .addr();
    assert!(
        region.end() <= base + pool.chunk_bytes(),
        "{region:?} runs past the end of chunk {chunk}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_shares_log_between_clones() {
        let observer = RecordingObserver::new();
        let clone = observer.clone();
        clone.on_event(&PoolEvent::Cleared { chunks: 1 });
        assert_eq!(observer.events(), vec![PoolEvent::Cleared { chunks: 1 }]);
        observer.clear();
        assert!(clone.events().is_empty());
    }

    #[test]
    fn recording_pool_counts_created_chunks() {
        let (pool, observer) = recording_pool(8);
        pool.allocate(8, 1).unwrap();
        pool.allocate(8, 1).unwrap();
        pool.allocate(8, 1).unwrap();
        assert_eq!(observer.chunks_created(), 2);
        assert_eq!(observer.chunks_reused(), 0);
    }

    #[test]
    fn touching_regions_do_not_overlap() {
        let a = Region { start: 0, len: 8 };
        let b = Region { start: 8, len: 8 };
        assert!(!a.overlaps(&b));
        assert_disjoint(&[b, a]);
    }

    #[test]
    fn empty_regions_never_overlap() {
        let a = Region { start: 4, len: 0 };
        let b = Region { start: 0, len: 8 };
        assert!(!a.overlaps(&b));
    }

    #[test]
    #[should_panic(expected = "regions overlap")]
    fn overlapping_regions_panic() {
        assert_disjoint(&[Region { start: 0, len: 8 }, Region { start: 7, len: 2 }]);
    }

    #[test]
    fn pool_region_is_within_pool() {
        let pool = MemPool::new(32).unwrap();
        let p = pool.allocate(12, 1).unwrap();
        assert_within_pool(&pool, Region::new(p.as_ptr(), 12));
    }
}
