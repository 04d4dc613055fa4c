//! Offset generation
//!
//! Workers pick the next IO position through a [`Distribution`], which yields
//! block numbers rather than byte offsets. The [`OffsetGenerator`] converts a
//! block number into a byte offset with a single multiplication, so every offset
//! is block-aligned by construction and no transfer can run past the file end:
//!
//! ```text
//! num_blocks = file_size / block_size          (floor)
//! offset     = block_num * block_size          block_num in [0, num_blocks)
//! offset + block_size <= file_size             always
//! ```
//!
//! # Example
//!
//! ```
//! use storagebench::distribution::{AccessPattern, OffsetGenerator};
//!
//! let mut offsets = OffsetGenerator::new(AccessPattern::Sequential, 4096, 3 * 4096, 1);
//! assert_eq!(offsets.next_offset(), 0);
//! assert_eq!(offsets.next_offset(), 4096);
//! assert_eq!(offsets.next_offset(), 8192);
//! assert_eq!(offsets.next_offset(), 0); // wrapped
//! ```

use serde::{Deserialize, Serialize};

pub mod sequential;
pub mod uniform;

/// Block number generator
///
/// Distributions must be `Send`; each worker owns its own instance so there is
/// no shared mutable state between workers.
pub trait Distribution: Send {
    /// Next block number in the range `[0, num_blocks)`
    ///
    /// Implementations return 0 when `num_blocks` is 0.
    fn next_block(&mut self, num_blocks: u64) -> u64;
}

/// How a worker walks the file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccessPattern {
    Sequential,
    Random,
}

/// Multiplier used to derive a worker's RNG seed from its id
///
/// Runs are reproducible per worker id, while no two workers share a stream.
pub const WORKER_SEED_MULTIPLIER: u64 = 88_172_645_463_393_265;

/// Seed for the random offset stream of worker `worker_id`
#[inline]
pub fn worker_seed(worker_id: usize) -> u64 {
    (worker_id as u64).wrapping_mul(WORKER_SEED_MULTIPLIER)
}

/// Converts a worker's block distribution into byte offsets
pub struct OffsetGenerator {
    distribution: Box<dyn Distribution>,
    block_size: u64,
    num_blocks: u64,
}

impl OffsetGenerator {
    /// Create the generator for one worker
    ///
    /// Sequential workers each start at block 0 with a private cursor. Random
    /// workers are seeded from `worker_id` via [`worker_seed`].
    pub fn new(pattern: AccessPattern, block_size: u64, file_size: u64, worker_id: usize) -> Self {
        let distribution: Box<dyn Distribution> = match pattern {
            AccessPattern::Sequential => Box::new(sequential::SequentialDistribution::new()),
            AccessPattern::Random => {
                Box::new(uniform::UniformDistribution::with_seed(worker_seed(worker_id)))
            }
        };

        Self::with_distribution(distribution, block_size, file_size)
    }

    /// Create a generator around an arbitrary distribution
    pub fn with_distribution(
        distribution: Box<dyn Distribution>,
        block_size: u64,
        file_size: u64,
    ) -> Self {
        let num_blocks = if block_size == 0 { 0 } else { file_size / block_size };
        Self {
            distribution,
            block_size,
            num_blocks,
        }
    }

    /// Number of whole blocks that fit in the file
    pub fn num_blocks(&self) -> u64 {
        self.num_blocks
    }

    /// Byte offset of the next transfer
    #[inline(always)]
    pub fn next_offset(&mut self) -> u64 {
        self.distribution.next_block(self.num_blocks) * self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_offsets_wrap_at_file_bound() {
        let block = 4096u64;
        let file = 10 * block + 100; // trailing partial block is never touched
        let mut gen = OffsetGenerator::new(AccessPattern::Sequential, block, file, 1);

        let offsets: Vec<u64> = (0..25).map(|_| gen.next_offset()).collect();
        for (i, off) in offsets.iter().enumerate() {
            assert_eq!(*off, (i as u64 % 10) * block);
            assert!(off + block <= file);
        }
    }

    #[test]
    fn test_random_offsets_aligned_and_in_bounds() {
        let block = 4096u64;
        let file = 64 * 1024 * 1024u64;
        let mut gen = OffsetGenerator::new(AccessPattern::Random, block, file, 3);

        for _ in 0..10_000 {
            let off = gen.next_offset();
            assert_eq!(off % block, 0);
            assert!(off <= file - block);
        }
    }

    #[test]
    fn test_random_offsets_reproducible_per_worker() {
        let mut a = OffsetGenerator::new(AccessPattern::Random, 512, 1 << 20, 2);
        let mut b = OffsetGenerator::new(AccessPattern::Random, 512, 1 << 20, 2);
        let mut c = OffsetGenerator::new(AccessPattern::Random, 512, 1 << 20, 3);

        let seq_a: Vec<u64> = (0..32).map(|_| a.next_offset()).collect();
        let seq_b: Vec<u64> = (0..32).map(|_| b.next_offset()).collect();
        let seq_c: Vec<u64> = (0..32).map(|_| c.next_offset()).collect();

        assert_eq!(seq_a, seq_b);
        assert_ne!(seq_a, seq_c);
    }

    #[test]
    fn test_block_equal_to_file_size() {
        let mut seq = OffsetGenerator::new(AccessPattern::Sequential, 8192, 8192, 1);
        let mut rnd = OffsetGenerator::new(AccessPattern::Random, 8192, 8192, 1);
        assert_eq!(seq.num_blocks(), 1);
        for _ in 0..5 {
            assert_eq!(seq.next_offset(), 0);
            assert_eq!(rnd.next_offset(), 0);
        }
    }

    #[test]
    fn test_worker_seed_distinct() {
        assert_ne!(worker_seed(1), worker_seed(2));
        assert_eq!(worker_seed(0), 0);
    }
}
