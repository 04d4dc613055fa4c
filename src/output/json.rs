//! JSON output formatting
//!
//! The report holds the run configuration, when the report was produced, every
//! run's full result (series included) and the mean throughput across runs.

use super::text::mean_throughput;
use crate::config::BenchConfig;
use crate::stats::RunResult;
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Top-level JSON document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub tool: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub config: BenchConfig,
    pub runs: Vec<RunResult>,
    pub mean_throughput_mbps: f64,
}

impl JsonReport {
    pub fn new(config: &BenchConfig, runs: &[RunResult]) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            config: config.clone(),
            runs: runs.to_vec(),
            mean_throughput_mbps: mean_throughput(runs),
        }
    }
}

/// Write JSON output to file
pub fn write_json_output(output_path: &Path, report: &JsonReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;
    let writer = BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(writer, report)?;
    } else {
        serde_json::to_writer(writer, report)?;
    }

    Ok(())
}
