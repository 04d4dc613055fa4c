//! Human-readable text output

use crate::config::BenchConfig;
use crate::stats::{RunResult, ThroughputPoint};
use crate::util::time::{format_bytes, format_number, format_rate};

/// Print the run configuration banner
pub fn print_configuration(config: &BenchConfig, runs: usize) {
    println!("Configuration:");
    println!("  Target:      {}", config.path.display());
    println!("  Test:        {}", config.test_type);
    println!("  File size:   {}", format_bytes(config.file_size));
    println!(
        "  Block size:  {} ({} blocks)",
        format_bytes(config.block_size),
        config.num_blocks()
    );
    println!("  Queue depth: {}", config.queue_depth);
    println!("  Duration:    {}s (warmup {}s)", config.duration_secs, config.warmup_secs);
    println!("  Direct IO:   {}", if config.direct { "requested" } else { "off" });
    if runs > 1 {
        println!("  Runs:        {}", runs);
    }
}

/// Print one live throughput sample
pub fn print_live_point(run: usize, point: &ThroughputPoint) {
    println!(
        "  [run {}] {:>4}s  {:>10.2} MB/s",
        run,
        point.second_index + 1,
        point.megabytes_per_second
    );
}

/// One-line summary of a run, e.g. `Run 1: 512.30 MB/s, QD=4, blk=128KB`
pub fn run_summary_line(run: usize, config: &BenchConfig, result: &RunResult) -> String {
    format!(
        "Run {}: {:.2} MB/s, QD={}, blk={}KB",
        run,
        result.avg_throughput_mbps,
        config.queue_depth,
        config.block_size / 1024
    )
}

/// Print the detailed results of one run
pub fn print_results(run: usize, config: &BenchConfig, result: &RunResult) {
    println!("═══════════════════════════════════════════════════════════");
    println!("  {}", run_summary_line(run, config, result));
    println!("═══════════════════════════════════════════════════════════");

    println!("Throughput: {:.2} MB/s", result.avg_throughput_mbps);
    println!("IOPS:       {}", format_rate(result.avg_iops));
    println!(
        "Total:      {} ops ({})",
        format_number(result.total_ops),
        format_bytes(result.total_bytes)
    );
    println!("Engine:     {}", result.io_engine_description);
    println!();

    println!("Latency:");
    let latency = &result.latency;
    if latency.samples > 0 {
        println!("  Mean: {:.3} ms", latency.mean_ms);
        println!("  p50:  {:.3} ms", latency.p50_ms);
        println!("  p95:  {:.3} ms", latency.p95_ms);
        println!("  p99:  {:.3} ms", latency.p99_ms);
        println!("  Max:  {:.3} ms", latency.max_ms);
    } else {
        println!("  No latency data collected");
    }

    if !result.note.is_empty() {
        println!();
        println!("Note: {}", result.note);
    }
    println!();
}

/// Mean of the per-run average throughput
pub fn mean_throughput(results: &[RunResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.avg_throughput_mbps).sum::<f64>() / results.len() as f64
}

/// Print the per-run summary lines and their mean
pub fn print_summary(config: &BenchConfig, results: &[RunResult]) {
    println!("Summary:");
    for (i, result) in results.iter().enumerate() {
        println!("  {}", run_summary_line(i + 1, config, result));
    }
    if results.len() > 1 {
        println!("  Mean: {:.2} MB/s over {} runs", mean_throughput(results), results.len());
    }
}
