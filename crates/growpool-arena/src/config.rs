//! Pool configuration parameters.

use crate::error::ArenaError;

/// Alignment of every chunk's backing storage, in bytes.
///
/// Matches the largest fundamental alignment on the supported 64-bit
/// targets, so offset 0 of a fresh chunk satisfies any layout the adapter
/// accepts.
pub const CHUNK_ALIGN: usize = 16;

/// Configuration for a [`MemPool`](crate::MemPool).
///
/// Validated at construction; immutable for the lifetime of the pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Capacity of every chunk in bytes.
    ///
    /// Default: 65_536 (64 KiB). Must be non-zero. This is also the largest
    /// single request the pool will serve.
    pub chunk_bytes: usize,
}

impl PoolConfig {
    /// Default chunk capacity: 64 KiB.
    pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

    /// Create a config with the given chunk capacity in bytes.
    pub fn new(chunk_bytes: usize) -> Self {
        Self { chunk_bytes }
    }

    /// Size chunks to hold `elements` values of `T`.
    ///
    /// Saturates at `usize::MAX` rather than wrapping; a saturated size
    /// will fail when the first chunk is allocated.
    pub fn for_elements<T>(elements: usize) -> Self {
        Self::new(elements.saturating_mul(std::mem::size_of::<T>()))
    }

    /// Check the config for values the pool cannot work with.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.chunk_bytes == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "chunk_bytes must be greater than zero",
            });
        }
        if self.chunk_bytes > isize::MAX as usize - (CHUNK_ALIGN - 1) {
            return Err(ArenaError::InvalidConfig {
                reason: "chunk_bytes exceeds the maximum allocation size",
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHUNK_BYTES)
    }
}
