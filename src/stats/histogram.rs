//! Latency histogram using HdrHistogram
//!
//! Each worker owns one histogram and records the duration of every transfer it
//! completes during the measurement phase. Histograms are merged by the run
//! controller after the workers join, so recording never contends on shared
//! state.
//!
//! # Example
//!
//! ```
//! use storagebench::stats::histogram::LatencyHistogram;
//! use std::time::Duration;
//!
//! let mut hist = LatencyHistogram::new();
//! hist.record(Duration::from_micros(100));
//! hist.record(Duration::from_micros(150));
//! hist.record(Duration::from_micros(200));
//!
//! let p50 = hist.percentile(50.0);
//! let p99 = hist.percentile(99.0);
//! println!("p50: {:?}, p99: {:?}", p50, p99);
//! ```

use crate::Result;
use hdrhistogram::Histogram;
use std::time::Duration;

/// Highest trackable latency: one hour in nanoseconds
const MAX_TRACKABLE_NANOS: u64 = 3_600_000_000_000;

/// Significant digits kept per value (0.1% precision)
const SIGNIFICANT_DIGITS: u8 = 3;

/// Latency histogram wrapper
///
/// Tracks latencies from 1ns to 1 hour with 3 significant digits. Values outside
/// that range are clamped, so recording never fails.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        // Bounds are constants that satisfy hdrhistogram's constraints
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKABLE_NANOS, SIGNIFICANT_DIGITS)
            .expect("constant histogram bounds are valid");

        Self { histogram }
    }

    /// Record a latency sample
    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(MAX_TRACKABLE_NANOS);
        self.histogram.saturating_record(nanos.clamp(1, MAX_TRACKABLE_NANOS));
    }

    /// Get the value at a specific percentile (0.0 - 100.0)
    ///
    /// Returns `None` if nothing has been recorded.
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.value_at_percentile(percentile)))
    }

    pub fn min(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.min()))
    }

    pub fn max(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.max()))
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.mean() as u64))
    }

    /// Number of samples recorded
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Merge another histogram into this one
    pub fn merge(&mut self, other: &LatencyHistogram) -> Result<()> {
        self.histogram
            .add(&other.histogram)
            .map_err(|e| anyhow::anyhow!("Failed to merge histograms: {}", e))?;
        Ok(())
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}
