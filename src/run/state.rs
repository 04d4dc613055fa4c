//! Shared run state
//!
//! The only mutable state shared between the controller and its workers. It is
//! owned by the run controller and lent to workers by reference for the
//! lifetime of the run. Counters are increment-only, and each flag makes a
//! single false-to-true transition (`measuring` also goes back to false once).
//!
//! All accesses use relaxed ordering: workers need no ordering relative to one
//! another, and the sampler only needs eventual visibility of the counters.

use crossbeam::utils::CachePadded;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Stop flag, measurement window flag and transfer counters
///
/// Counters sit on separate cache lines so concurrent increments from many
/// workers do not false-share with each other or with the flags they poll.
#[derive(Debug, Default)]
pub struct RunState {
    stop: CachePadded<AtomicBool>,
    measuring: CachePadded<AtomicBool>,
    bytes: CachePadded<AtomicU64>,
    ops: CachePadded<AtomicU64>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether workers should leave their loop
    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Ask every worker to stop after its current transfer
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Guard that raises the stop flag when dropped, including during unwinding
    pub fn stop_on_drop(&self) -> StopGuard<'_> {
        StopGuard { state: self }
    }

    /// Open the measurement window (latencies are recorded from now on)
    pub fn begin_measuring(&self) {
        self.measuring.store(true, Ordering::Relaxed);
    }

    pub fn end_measuring(&self) {
        self.measuring.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_measuring(&self) -> bool {
        self.measuring.load(Ordering::Relaxed)
    }

    /// Account one completed transfer of `bytes` bytes
    #[inline]
    pub fn record_transfer(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.ops.fetch_add(1, Ordering::Relaxed);
    }

    /// Cumulative bytes since the run started (warmup included)
    #[inline]
    pub fn total_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Cumulative operations since the run started (warmup included)
    #[inline]
    pub fn total_ops(&self) -> u64 {
        self.ops.load(Ordering::Relaxed)
    }
}

/// Raises the stop flag of a [`RunState`] when dropped
///
/// Held by the controlling thread for as long as workers may be running, so a
/// panic in the sampler or an observer still lets the workers drain.
#[must_use = "the stop flag is raised as soon as the guard is dropped"]
pub struct StopGuard<'a> {
    state: &'a RunState,
}

impl Drop for StopGuard<'_> {
    fn drop(&mut self) {
        self.state.request_stop();
    }
}
