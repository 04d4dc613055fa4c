//! CSV output formatting
//!
//! One row per throughput point of every run:
//!
//! ```text
//! run,second,mbps
//! 1,0,512.250
//! 1,1,498.875
//! ```

use crate::stats::RunResult;
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const CSV_HEADER: &str = "run,second,mbps";

/// Write the series of every run as CSV
pub fn write_series<W: Write>(mut out: W, runs: &[RunResult]) -> Result<()> {
    writeln!(out, "{}", CSV_HEADER)?;

    for (i, run) in runs.iter().enumerate() {
        for point in &run.series {
            writeln!(
                out,
                "{},{},{:.3}",
                i + 1,
                point.second_index,
                point.megabytes_per_second
            )?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Write the series CSV to `path`
pub fn write_csv_output(path: &Path, runs: &[RunResult]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV output: {}", path.display()))?;
    write_series(BufWriter::new(file), runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{LatencySummary, ThroughputPoint};
    use crate::target::IoMode;

    fn run(points: &[f64]) -> RunResult {
        RunResult {
            avg_throughput_mbps: 0.0,
            avg_iops: 0.0,
            latency: LatencySummary::default(),
            total_bytes: 0,
            total_ops: 0,
            io_engine_description: String::new(),
            io_mode: IoMode::Buffered,
            series: points
                .iter()
                .enumerate()
                .map(|(i, &mbps)| ThroughputPoint {
                    second_index: i as u32,
                    megabytes_per_second: mbps,
                })
                .collect(),
            note: String::new(),
            worker_faults: 0,
        }
    }

    #[test]
    fn test_write_series() {
        let mut out = Vec::new();
        write_series(&mut out, &[run(&[1.5, 2.0]), run(&[3.25])]).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "run,second,mbps\n1,0,1.500\n1,1,2.000\n2,0,3.250\n");
    }

    #[test]
    fn test_write_csv_output_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("series.csv");

        write_csv_output(&path, &[run(&[])]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "run,second,mbps\n");
    }
}
