//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! The result of all three is a single immutable [`BenchConfig`] handed to the
//! run controller.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::distribution::AccessPattern;
use crate::engine::OperationType;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default target file size (2 GiB)
pub const DEFAULT_FILE_SIZE: u64 = 2048 * 1024 * 1024;
/// Default block size (128 KiB)
pub const DEFAULT_BLOCK_SIZE: u64 = 128 * 1024;
/// Default number of concurrent workers
pub const DEFAULT_QUEUE_DEPTH: usize = 4;
/// Default measurement window in seconds
pub const DEFAULT_DURATION_SECS: u64 = 20;
/// Default warmup in seconds
pub const DEFAULT_WARMUP_SECS: u64 = 3;

/// Complete configuration of one benchmark run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Target file (created for write tests, must exist for read tests)
    pub path: PathBuf,
    /// Access pattern and direction
    pub test_type: TestType,
    /// File size in bytes; all offsets stay below this bound
    pub file_size: u64,
    /// Size of every transfer in bytes
    pub block_size: u64,
    /// Number of concurrent worker threads
    pub queue_depth: usize,
    /// Measurement window in whole seconds
    pub duration_secs: u64,
    /// Warmup before measurement, in whole seconds
    pub warmup_secs: u64,
    /// Try to bypass the page cache (O_DIRECT), falling back to buffered IO
    pub direct: bool,
}

impl BenchConfig {
    /// Configuration with default sizing for the given target and test type
    pub fn new(path: impl Into<PathBuf>, test_type: TestType) -> Self {
        Self {
            path: path.into(),
            test_type,
            file_size: DEFAULT_FILE_SIZE,
            block_size: DEFAULT_BLOCK_SIZE,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            duration_secs: DEFAULT_DURATION_SECS,
            warmup_secs: DEFAULT_WARMUP_SECS,
            direct: false,
        }
    }

    /// Number of whole blocks the workers address
    pub fn num_blocks(&self) -> u64 {
        if self.block_size == 0 {
            0
        } else {
            self.file_size / self.block_size
        }
    }
}

/// Benchmark test type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TestType {
    /// Sequential writes
    #[serde(alias = "SEQ_WRITE")]
    #[value(alias = "SEQ_WRITE")]
    SeqWrite,
    /// Sequential reads
    #[serde(alias = "SEQ_READ")]
    #[value(alias = "SEQ_READ")]
    SeqRead,
    /// Random writes
    #[serde(alias = "RAND_WRITE")]
    #[value(alias = "RAND_WRITE")]
    RandWrite,
    /// Random reads
    #[serde(alias = "RAND_READ")]
    #[value(alias = "RAND_READ")]
    RandRead,
}

impl TestType {
    pub fn is_write(&self) -> bool {
        matches!(self, TestType::SeqWrite | TestType::RandWrite)
    }

    pub fn is_random(&self) -> bool {
        matches!(self, TestType::RandWrite | TestType::RandRead)
    }

    pub fn access_pattern(&self) -> AccessPattern {
        if self.is_random() {
            AccessPattern::Random
        } else {
            AccessPattern::Sequential
        }
    }

    pub fn operation(&self) -> OperationType {
        if self.is_write() {
            OperationType::Write
        } else {
            OperationType::Read
        }
    }

    /// Canonical upper-case name (`SEQ_WRITE`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::SeqWrite => "SEQ_WRITE",
            TestType::SeqRead => "SEQ_READ",
            TestType::RandWrite => "RAND_WRITE",
            TestType::RandRead => "RAND_READ",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = anyhow::Error;

    /// Accepts `SEQ_WRITE`, `seq-write`, `seq_write` and `seqwrite` spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "seqwrite" => Ok(TestType::SeqWrite),
            "seqread" => Ok(TestType::SeqRead),
            "randwrite" => Ok(TestType::RandWrite),
            "randread" => Ok(TestType::RandRead),
            _ => anyhow::bail!(
                "Unknown test type '{}' (expected SEQ_WRITE, SEQ_READ, RAND_WRITE or RAND_READ)",
                s
            ),
        }
    }
}
