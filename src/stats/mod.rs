//! Statistics
//!
//! - [`histogram`]: per-worker latency histograms (HdrHistogram)
//! - [`aggregate`]: average throughput and IOPS over the measurement phase
//! - [`result`]: the run result handed back to callers

pub mod aggregate;
pub mod histogram;
pub mod result;

pub use aggregate::{aggregate, Aggregate};
pub use histogram::LatencyHistogram;
pub use result::{LatencySummary, RunResult, ThroughputPoint};
