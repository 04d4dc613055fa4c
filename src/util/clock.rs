//! Monotonic clock
//!
//! All interval timing in a run (warmup, per-second sampling deadlines, and
//! per-operation latency) is taken from `CLOCK_MONOTONIC` through a direct
//! `clock_gettime` call. Wall-clock adjustments never affect a measurement.

use std::time::Duration;

/// Point on the monotonic clock with microsecond resolution
///
/// Internally the full nanosecond reading is kept so that latency samples of
/// fast devices (a few microseconds) do not collapse to zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant {
    nanos: u64,
}

impl MonotonicInstant {
    /// Read the current time from `CLOCK_MONOTONIC`
    #[inline(always)]
    pub fn now() -> Self {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        // SAFETY: `ts` is a valid, writable timespec and CLOCK_MONOTONIC is
        // always available on supported platforms.
        unsafe {
            libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
        }

        let nanos = (ts.tv_sec as u64) * 1_000_000_000 + (ts.tv_nsec as u64);

        Self { nanos }
    }

    /// Microseconds since the clock's (unspecified) epoch
    #[inline]
    pub fn as_micros(&self) -> u64 {
        self.nanos / 1_000
    }

    /// Duration since an earlier instant, saturating at zero
    #[inline(always)]
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(earlier.nanos))
    }

    /// Time elapsed since this instant
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        Self::now().duration_since(*self)
    }

    /// This instant shifted forward by `offset`, saturating at the clock's maximum
    #[inline]
    pub fn offset_by(&self, offset: Duration) -> Self {
        let offset = u64::try_from(offset.as_nanos()).unwrap_or(u64::MAX);
        Self {
            nanos: self.nanos.saturating_add(offset),
        }
    }
}

/// Current monotonic time in microseconds
#[inline]
pub fn now_us() -> u64 {
    MonotonicInstant::now().as_micros()
}

/// Block the calling thread until the monotonic clock reaches `deadline`
///
/// Returns immediately if the deadline has already passed.
pub fn sleep_until(deadline: MonotonicInstant) {
    let now = MonotonicInstant::now();
    if deadline > now {
        std::thread::sleep(deadline.duration_since(now));
    }
}
