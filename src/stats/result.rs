//! Run result types

use super::histogram::LatencyHistogram;
use crate::target::IoMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Throughput observed during one second of the measurement phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThroughputPoint {
    /// 0-based second within the measurement phase
    pub second_index: u32,

    /// MB (1,048,576 bytes) transferred during that second
    pub megabytes_per_second: f64,
}

/// Per-operation latency over the measurement phase, in milliseconds
///
/// All fields are zero only when no operation completed while measuring.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatencySummary {
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,

    /// Number of operations the figures are based on
    pub samples: u64,
}

fn as_ms(d: Option<Duration>) -> f64 {
    d.map(|d| d.as_secs_f64() * 1000.0).unwrap_or(0.0)
}

impl LatencySummary {
    pub fn from_histogram(hist: &LatencyHistogram) -> Self {
        Self {
            mean_ms: as_ms(hist.mean()),
            p50_ms: as_ms(hist.percentile(50.0)),
            p95_ms: as_ms(hist.percentile(95.0)),
            p99_ms: as_ms(hist.percentile(99.0)),
            max_ms: as_ms(hist.max()),
            samples: hist.len(),
        }
    }
}

/// Outcome of one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Average throughput over the measurement phase (MB/s)
    pub avg_throughput_mbps: f64,

    /// Average operations per second over the measurement phase
    pub avg_iops: f64,

    pub latency: LatencySummary,

    /// Bytes transferred during the measurement phase; always `total_ops * block_size`
    pub total_bytes: u64,

    /// Operations completed during the measurement phase
    pub total_ops: u64,

    /// Transfer mechanism and achieved IO mode, e.g. `"pread/pwrite, O_DIRECT"`
    pub io_engine_description: String,

    /// IO mode the target was actually opened in
    pub io_mode: IoMode,

    /// One point per measured second, in order
    pub series: Vec<ThroughputPoint>,

    /// Human-readable remarks (worker faults, sync failures); empty when clean
    pub note: String,

    /// Number of workers that stopped on a failed or short transfer
    pub worker_faults: usize,
}
