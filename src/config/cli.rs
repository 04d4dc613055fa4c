//! CLI argument parsing using clap

use crate::config::TestType;
use clap::Parser;
use std::path::PathBuf;

/// StorageBench - sustained storage throughput benchmark
///
/// Drives concurrent positioned reads or writes of a fixed block size against a
/// target file, warms up, then samples aggregate throughput once per second.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "storagebench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Target file path
    ///
    /// Created and pre-sized for write tests; must already hold at least
    /// `--file-size` bytes for read tests.
    #[arg(value_name = "PATH")]
    pub target: Option<PathBuf>,

    /// TOML configuration file (CLI flags take precedence)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    // === Run Options ===
    /// Test type
    #[arg(short = 'T', long = "test", value_enum)]
    pub test_type: Option<TestType>,

    /// File size (e.g., 64M, 2G) [default: 2G]
    #[arg(short = 's', long)]
    pub file_size: Option<String>,

    /// Block size for every transfer (e.g., 4k, 128k, 1M) [default: 128k]
    #[arg(short = 'b', long)]
    pub block_size: Option<String>,

    /// Number of concurrent worker threads (1-1024) [default: 4]
    #[arg(short = 'q', long)]
    pub queue_depth: Option<usize>,

    /// Measurement duration (e.g., 20, 20s, 2m) [default: 20s]
    #[arg(short = 'd', long)]
    pub duration: Option<String>,

    /// Warmup before measurement starts (e.g., 0, 3s) [default: 3s]
    #[arg(short = 'w', long)]
    pub warmup: Option<String>,

    /// Try direct IO (O_DIRECT); falls back to buffered IO if unavailable
    #[arg(long)]
    pub direct: bool,

    /// Number of back-to-back runs with the same configuration
    #[arg(short = 'r', long, default_value = "1")]
    pub runs: usize,

    // === Output Options ===
    /// Write all run results as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Write per-second series of all runs as CSV to this file
    #[arg(long, value_name = "FILE")]
    pub csv_output: Option<PathBuf>,

    /// Do not print per-second throughput while running
    #[arg(long)]
    pub no_live: bool,

    /// Validate and print the configuration without running
    #[arg(long)]
    pub dry_run: bool,

    /// Enable info-level logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Enable debug-level logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate flag combinations that clap cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.runs == 0 {
            anyhow::bail!("--runs must be at least 1");
        }

        if self.target.is_none() && self.config.is_none() {
            anyhow::bail!("A target PATH is required (or a --config file that sets `path`)");
        }

        Ok(())
    }

    /// Default log filter derived from the verbosity flags
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "storagebench=debug"
        } else if self.verbose {
            "storagebench=info"
        } else {
            "storagebench=warn"
        }
    }
}
