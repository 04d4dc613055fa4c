//! Shared utilities: monotonic clock, aligned buffers and report formatting

pub mod buffer;
pub mod clock;
pub mod time;
