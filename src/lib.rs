//! storagebench - sustained storage throughput benchmark
//!
//! Drives a configurable number of worker threads issuing block-sized
//! positioned reads or writes (sequential or random) against one target file,
//! warms up, then samples aggregate throughput once per second for a fixed
//! measurement window.
//!
//! # Architecture
//!
//! - **target**: opens the file, with `O_DIRECT` and buffered fallback
//! - **worker**: per-thread transfer loop over an IO engine and offset generator
//! - **run**: controller state machine, shared run state, per-second sampler
//! - **stats**: latency histograms, aggregation, run result
//! - **config / output**: CLI + TOML configuration, text/JSON/CSV reports

pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod output;
pub mod run;
pub mod stats;
pub mod target;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::{BenchConfig, TestType};
pub use error::BenchError;
pub use run::{run_benchmark, RunController, RunPhase};
pub use stats::{RunResult, ThroughputPoint};

/// Result type used throughout storagebench
pub type Result<T> = anyhow::Result<T>;
