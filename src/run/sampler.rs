//! Per-second throughput sampler
//!
//! Runs on the controlling thread during the measurement phase. Every tick it
//! reads the cumulative byte counter, takes the delta from the previous
//! reading, and appends one [`ThroughputPoint`]. Ticks are scheduled against
//! absolute deadlines (`start + (i + 1)s`), so a late wakeup shortens the next
//! sleep instead of pushing every later sample back.
//!
//! A counter read may land between two workers' increments. That only moves a
//! few bytes from one bucket into the next; the series total stays exact.

use super::state::RunState;
use crate::stats::ThroughputPoint;
use crate::util::clock::{sleep_until, MonotonicInstant};
use crate::util::time::BYTES_PER_MB;
use std::time::Duration;

/// Upper bound on the up-front series allocation (one hour of points)
const MAX_PREALLOCATED_POINTS: u64 = 3600;

pub struct Sampler<'a> {
    state: &'a RunState,
    previous_bytes: u64,
    next_index: u32,
    series: Vec<ThroughputPoint>,
}

impl<'a> Sampler<'a> {
    /// Create a sampler whose first delta is taken from `baseline_bytes`
    pub fn new(state: &'a RunState, baseline_bytes: u64) -> Self {
        Self {
            state,
            previous_bytes: baseline_bytes,
            next_index: 0,
            series: Vec::new(),
        }
    }

    /// Take one sample now and append it to the series
    pub fn sample(&mut self) -> ThroughputPoint {
        let current = self.state.total_bytes();
        let delta = current.saturating_sub(self.previous_bytes);
        self.previous_bytes = current;

        let point = ThroughputPoint {
            second_index: self.next_index,
            megabytes_per_second: delta as f64 / BYTES_PER_MB,
        };
        self.next_index += 1;
        self.series.push(point);
        point
    }

    /// Sample once per second for `duration_secs` seconds starting at `start`
    ///
    /// `observer` sees each point as soon as it is produced.
    pub fn run<F>(mut self, start: MonotonicInstant, duration_secs: u64, mut observer: F) -> Vec<ThroughputPoint>
    where
        F: FnMut(&ThroughputPoint),
    {
        self.series.reserve(duration_secs.min(MAX_PREALLOCATED_POINTS) as usize);

        for i in 0..duration_secs {
            let deadline = start.offset_by(Duration::from_secs(i + 1));
            sleep_until(deadline);
            let point = self.sample();
            observer(&point);
        }

        self.series
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_deltas() {
        let state = RunState::new();
        state.record_transfer(1_048_576);

        // Baseline excludes the warmup megabyte
        let mut sampler = Sampler::new(&state, state.total_bytes());

        state.record_transfer(2 * 1_048_576);
        let p0 = sampler.sample();
        assert_eq!(p0.second_index, 0);
        assert_eq!(p0.megabytes_per_second, 2.0);

        let p1 = sampler.sample();
        assert_eq!(p1.second_index, 1);
        assert_eq!(p1.megabytes_per_second, 0.0);

        state.record_transfer(524_288);
        let p2 = sampler.sample();
        assert_eq!(p2.second_index, 2);
        assert_eq!(p2.megabytes_per_second, 0.5);
    }

    #[test]
    fn test_run_zero_duration() {
        let state = RunState::new();
        let mut seen = 0;
        let series = Sampler::new(&state, 0).run(MonotonicInstant::now(), 0, |_| seen += 1);
        assert!(series.is_empty());
        assert_eq!(seen, 0);
    }

    #[test]
    fn test_run_produces_one_point_per_second() {
        let state = RunState::new();
        let start = MonotonicInstant::now();
        let mut observed = Vec::new();

        let series = Sampler::new(&state, 0).run(start, 2, |p| observed.push(p.second_index));

        assert_eq!(series.len(), 2);
        assert_eq!(observed, vec![0, 1]);
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(series.iter().all(|p| p.megabytes_per_second == 0.0));
    }
}
