//! Sequential block generation
//!
//! Generates sequential block numbers starting from 0 and incrementing by 1.
//! When the next block would run past the end of the file, wraps back to 0.

use crate::distribution::Distribution;

/// Sequential block generator with a private cursor
#[derive(Debug, Default)]
pub struct SequentialDistribution {
    /// Block number returned by the next call
    current_block: u64,
}

impl SequentialDistribution {
    pub fn new() -> Self {
        Self { current_block: 0 }
    }
}

impl Distribution for SequentialDistribution {
    #[inline]
    fn next_block(&mut self, num_blocks: u64) -> u64 {
        if num_blocks == 0 {
            return 0;
        }

        // A cursor left beyond a shrunken range restarts at 0
        if self.current_block >= num_blocks {
            self.current_block = 0;
        }

        let block = self.current_block;

        self.current_block += 1;
        if self.current_block >= num_blocks {
            self.current_block = 0;
        }

        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_basic() {
        let mut dist = SequentialDistribution::new();

        assert_eq!(dist.next_block(100), 0);
        assert_eq!(dist.next_block(100), 1);
        assert_eq!(dist.next_block(100), 2);
        assert_eq!(dist.next_block(100), 3);
    }

    #[test]
    fn test_sequential_wraparound() {
        let mut dist = SequentialDistribution::new();
        let num_blocks = 3;

        assert_eq!(dist.next_block(num_blocks), 0);
        assert_eq!(dist.next_block(num_blocks), 1);
        assert_eq!(dist.next_block(num_blocks), 2);
        assert_eq!(dist.next_block(num_blocks), 0); // Wrapped
        assert_eq!(dist.next_block(num_blocks), 1);
    }

    #[test]
    fn test_sequential_single_block() {
        let mut dist = SequentialDistribution::new();
        for _ in 0..4 {
            assert_eq!(dist.next_block(1), 0);
        }
    }

    #[test]
    fn test_sequential_empty_range() {
        let mut dist = SequentialDistribution::new();
        assert_eq!(dist.next_block(0), 0);
    }
}
