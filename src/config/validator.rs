//! Configuration validation

use super::BenchConfig;
use crate::util::buffer::DIRECT_IO_ALIGNMENT;
use anyhow::Result;
use tracing::warn;

/// Maximum number of concurrent workers
pub const MAX_QUEUE_DEPTH: usize = 1024;

/// Longest accepted warmup or measurement phase, in seconds
pub const MAX_PHASE_SECS: u64 = i32::MAX as u64;

/// Validate a run configuration
///
/// Hard errors are returned for anything that would make offset arithmetic or
/// worker setup meaningless. Settings that merely risk degraded results (such
/// as an unaligned block size with direct IO) are logged and allowed.
pub fn validate_config(config: &BenchConfig) -> Result<()> {
    if config.path.as_os_str().is_empty() {
        anyhow::bail!("path must not be empty");
    }

    if config.file_size == 0 {
        anyhow::bail!("file_size must be greater than 0");
    }

    if config.block_size == 0 {
        anyhow::bail!("block_size must be greater than 0");
    }

    if config.block_size > config.file_size {
        anyhow::bail!(
            "block_size ({}) must not exceed file_size ({})",
            config.block_size,
            config.file_size
        );
    }

    if config.block_size > i32::MAX as u64 {
        anyhow::bail!("block_size must be below 2 GiB, got {}", config.block_size);
    }

    if config.queue_depth == 0 || config.queue_depth > MAX_QUEUE_DEPTH {
        anyhow::bail!(
            "queue_depth must be between 1 and {}, got {}",
            MAX_QUEUE_DEPTH,
            config.queue_depth
        );
    }

    if config.duration_secs > MAX_PHASE_SECS {
        anyhow::bail!(
            "duration must be at most {} seconds, got {}",
            MAX_PHASE_SECS,
            config.duration_secs
        );
    }

    if config.warmup_secs > MAX_PHASE_SECS {
        anyhow::bail!(
            "warmup must be at most {} seconds, got {}",
            MAX_PHASE_SECS,
            config.warmup_secs
        );
    }

    if config.direct && config.block_size % DIRECT_IO_ALIGNMENT as u64 != 0 {
        warn!(
            block_size = config.block_size,
            alignment = DIRECT_IO_ALIGNMENT,
            "block size is not a multiple of the direct IO alignment; transfers may fail if O_DIRECT engages"
        );
    }

    if config.file_size % config.block_size != 0 {
        warn!(
            file_size = config.file_size,
            block_size = config.block_size,
            "file size is not a multiple of the block size; the trailing partial block is never accessed"
        );
    }

    Ok(())
}
