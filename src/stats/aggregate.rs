//! Measurement-phase aggregation
//!
//! Turns the official measurement totals into average throughput and IOPS. A
//! zero-length measurement phase yields zeros rather than a division by zero.

use crate::util::time::BYTES_PER_MB;
use serde::{Deserialize, Serialize};

/// Averages over the measurement phase
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregate {
    /// Average throughput in MB/s (1 MB = 1,048,576 bytes)
    pub avg_throughput_mbps: f64,

    /// Average completed operations per second
    pub avg_iops: f64,
}

/// Compute average throughput and IOPS over `duration_secs`
///
/// ```
/// use storagebench::stats::aggregate::aggregate;
///
/// let agg = aggregate(3 * 1_048_576, 768, 3);
/// assert_eq!(agg.avg_throughput_mbps, 1.0);
/// assert_eq!(agg.avg_iops, 256.0);
///
/// assert_eq!(aggregate(4096, 1, 0).avg_iops, 0.0);
/// ```
pub fn aggregate(total_bytes: u64, total_ops: u64, duration_secs: u64) -> Aggregate {
    if duration_secs == 0 {
        return Aggregate::default();
    }

    let secs = duration_secs as f64;
    Aggregate {
        avg_throughput_mbps: total_bytes as f64 / BYTES_PER_MB / secs,
        avg_iops: total_ops as f64 / secs,
    }
}
