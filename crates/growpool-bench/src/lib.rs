//! Workload profiles and utilities for benchmarking growpool.
//!
//! Provides deterministic request streams for driving a pool:
//!
//! - [`request_sizes`]: seeded random sizes in `1..=max_bytes`
//! - [`small_object_profile`]: many small same-lifetime objects
//! - [`mixed_profile`]: small objects interleaved with near-chunk-sized buffers
//! - [`replay`]: feed a stream through a pool and collect its statistics

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use growpool_arena::{ArenaError, MemPool};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Chunk size used by the reference profiles: 64 KiB.
pub const PROFILE_CHUNK_BYTES: usize = 64 * 1024;

/// `count` request sizes drawn uniformly from `1..=max_bytes`.
///
/// The same seed always yields the same stream.
pub fn request_sizes(seed: u64, count: usize, max_bytes: usize) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let max = max_bytes.max(1) as u64;
    (0..count)
        .map(|_| (rng.next_u64() % max) as usize + 1)
        .collect()
}

/// 10K requests of 8..=64 bytes: list nodes, small structs.
pub fn small_object_profile(seed: u64) -> Vec<usize> {
    request_sizes(seed, 10_000, 57)
        .into_iter()
        .map(|n| n + 7)
        .collect()
}

/// 10K requests where every 16th is a buffer of up to a whole chunk.
pub fn mixed_profile(seed: u64) -> Vec<usize> {
    let small = small_object_profile(seed);
    let large = request_sizes(
        seed ^ 0x9E37_79B9_7F4A_7C15,
        small.len() / 16 + 1,
        PROFILE_CHUNK_BYTES,
    );
    small
        .into_iter()
        .enumerate()
        .map(|(i, n)| if i % 16 == 15 { large[i / 16] } else { n })
        .collect()
}

/// What a pool looked like after serving a request stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayStats {
    /// Requests served.
    pub served: usize,
    /// Bytes requested in total.
    pub requested_bytes: usize,
    /// Chunks in the chain afterwards.
    pub chunks: usize,
    /// Bytes owned by the pool afterwards.
    pub memory_bytes: usize,
}

impl ReplayStats {
    /// Fraction of owned memory that was handed out, in `0.0..=1.0`.
    pub fn utilisation(&self) -> f64 {
        if self.memory_bytes == 0 {
            return 0.0;
        }
        self.requested_bytes as f64 / self.memory_bytes as f64
    }
}

/// Serve every size in `sizes` from `pool`, writing one byte into each
/// region so the storage is actually touched.
pub fn replay(pool: &MemPool, sizes: &[usize]) -> Result<ReplayStats, ArenaError> {
    let mut requested_bytes = 0;
    for &len in sizes {
        let bytes = pool.alloc_bytes(len)?;
        if let Some(first) = bytes.first_mut() {
            *first = 1;
        }
        requested_bytes += len;
    }
    Ok(ReplayStats {
        served: sizes.len(),
        requested_bytes,
        chunks: pool.chunk_count(),
        memory_bytes: pool.memory_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_sizes_are_deterministic() {
        assert_eq!(request_sizes(7, 100, 64), request_sizes(7, 100, 64));
        assert_ne!(request_sizes(7, 100, 64), request_sizes(8, 100, 64));
    }

    #[test]
    fn request_sizes_stay_in_range() {
        let sizes = request_sizes(1, 1000, 10);
        assert!(sizes.iter().all(|&n| (1..=10).contains(&n)));
    }

    #[test]
    fn small_profile_bounds() {
        let sizes = small_object_profile(3);
        assert_eq!(sizes.len(), 10_000);
        assert!(sizes.iter().all(|&n| (8..=64).contains(&n)));
    }

    #[test]
    fn mixed_profile_fits_reference_chunks() {
        let sizes = mixed_profile(3);
        assert!(sizes.iter().all(|&n| n <= PROFILE_CHUNK_BYTES));
        let pool = MemPool::new(PROFILE_CHUNK_BYTES).unwrap();
        let stats = replay(&pool, &sizes).unwrap();
        assert_eq!(stats.served, sizes.len());
        assert!(stats.utilisation() > 0.0 && stats.utilisation() <= 1.0);
    }

    #[test]
    fn replay_reports_over_capacity() {
        let pool = MemPool::new(16).unwrap();
        let result = replay(&pool, &[8, 17]);
        assert!(matches!(result, Err(ArenaError::OverCapacityRequest { .. })));
    }
}
