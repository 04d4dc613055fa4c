//! Uniform random distribution
//!
//! All blocks have equal probability. Uses the xoshiro256++ PRNG, which is
//! fast enough to sit on the per-IO hot path and has good statistical quality.

use super::Distribution;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Uniform random block generator
pub struct UniformDistribution {
    rng: Xoshiro256PlusPlus,
}

impl UniformDistribution {
    /// Create a distribution with a fixed seed
    ///
    /// The same seed always produces the same block sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl Distribution for UniformDistribution {
    #[inline(always)]
    fn next_block(&mut self, num_blocks: u64) -> u64 {
        if num_blocks == 0 {
            return 0;
        }
        self.rng.gen_range(0..num_blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_distribution_basic() {
        let mut dist = UniformDistribution::with_seed(7);

        for _ in 0..100 {
            let block_num = dist.next_block(1000);
            assert!(block_num < 1000);
        }
    }

    #[test]
    fn test_uniform_distribution_zero_max() {
        let mut dist = UniformDistribution::with_seed(7);
        assert_eq!(dist.next_block(0), 0);
    }

    #[test]
    fn test_uniform_distribution_seeded() {
        let mut dist1 = UniformDistribution::with_seed(12345);
        let mut dist2 = UniformDistribution::with_seed(12345);

        for _ in 0..10 {
            assert_eq!(dist1.next_block(1000), dist2.next_block(1000));
        }
    }

    #[test]
    fn test_uniform_distribution_coverage() {
        let mut dist = UniformDistribution::with_seed(42);
        let num_blocks = 100u64;
        let mut buckets = vec![0u32; 10];

        for _ in 0..10000 {
            let block_num = dist.next_block(num_blocks);
            buckets[(block_num * 10 / num_blocks) as usize] += 1;
        }

        // Each bucket should hold roughly 1000 samples; allow 20% deviation
        for count in buckets {
            assert!(count > 800 && count < 1200, "Bucket count {} outside expected range", count);
        }
    }
}
