//! Run controller
//!
//! Drives one benchmark run through its phases:
//!
//! ```text
//! Idle -> Opening -> Warming -> Measuring -> Draining -> Finalized
//!            |
//!            +-> Failed (target could not be opened, worker spawn failed)
//! ```
//!
//! Workers start as soon as the target is open and run through the warmup. The
//! controller snapshots the counters at the warmup/measurement boundary and
//! again after the last sample, so only measurement-phase transfers make it
//! into the official totals. Worker threads are scoped: they borrow the run
//! state and the target's descriptor, and the target cannot be closed until
//! every worker has joined.
//!
//! # Example
//!
//! ```no_run
//! use storagebench::config::{BenchConfig, TestType};
//! use storagebench::run::RunController;
//!
//! let mut config = BenchConfig::new("/tmp/bench.bin", TestType::SeqWrite);
//! config.duration_secs = 5;
//!
//! let mut controller = RunController::new(config)
//!     .with_observer(|p| println!("{:>3}s {:.1} MB/s", p.second_index + 1, p.megabytes_per_second));
//! let result = controller.run()?;
//! println!("{:.1} MB/s avg", result.avg_throughput_mbps);
//! # Ok::<(), storagebench::error::BenchError>(())
//! ```

pub mod sampler;
pub mod state;

use crate::config::validator::validate_config;
use crate::config::BenchConfig;
use crate::engine::sync::SyncEngine;
use crate::engine::IOEngine;
use crate::error::BenchError;
use crate::stats::{aggregate, LatencyHistogram, LatencySummary, RunResult, ThroughputPoint};
use crate::target::{open_file, open_target_with, OpenFn};
use crate::util::clock::{sleep_until, MonotonicInstant};
use crate::worker::{Worker, WorkerFault, WorkerOutcome, WorkerStatus};
use sampler::Sampler;
use state::RunState;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle phase of a [`RunController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Opening,
    Warming,
    Measuring,
    Draining,
    Finalized,
    Failed,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Opening => "opening",
            RunPhase::Warming => "warming",
            RunPhase::Measuring => "measuring",
            RunPhase::Draining => "draining",
            RunPhase::Finalized => "finalized",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

type EngineFactory<'a> = Box<dyn Fn() -> Box<dyn IOEngine> + 'a>;
type PointObserver<'a> = Box<dyn FnMut(&ThroughputPoint) + 'a>;

/// Counter readings taken while the workers were running
struct Measurement {
    series: Vec<ThroughputPoint>,
    measured_ops: u64,
    outcomes: Vec<WorkerOutcome>,
    engine_name: &'static str,
}

/// Orchestrates a single benchmark run
pub struct RunController<'a> {
    config: BenchConfig,
    phase: RunPhase,
    engine_factory: EngineFactory<'a>,
    opener: OpenFn,
    observer: Option<PointObserver<'a>>,
}

impl<'a> RunController<'a> {
    /// Controller using the pread/pwrite engine
    pub fn new(config: BenchConfig) -> Self {
        Self {
            config,
            phase: RunPhase::Idle,
            engine_factory: Box::new(|| Box::new(SyncEngine::new()) as Box<dyn IOEngine>),
            opener: open_file,
            observer: None,
        }
    }

    /// Call `observer` with every throughput point as soon as it is sampled
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&ThroughputPoint) + 'a,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Build each worker's engine with `factory` instead of the default
    pub fn with_engine_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn IOEngine> + 'a,
    {
        self.engine_factory = Box::new(factory);
        self
    }

    /// Open the target with `opener` instead of [`open_file`]
    pub fn with_opener(mut self, opener: OpenFn) -> Self {
        self.opener = opener;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    fn transition(&mut self, next: RunPhase) {
        debug!(from = %self.phase, to = %next, "run phase");
        self.phase = next;
    }

    fn fail(&mut self, err: BenchError) -> BenchError {
        warn!(phase = %self.phase, error = %err, "run failed");
        self.transition(RunPhase::Failed);
        err
    }

    /// Execute the run and return its result
    ///
    /// Only initialization failures are errors. Workers that stop on a failed
    /// transfer are counted in [`RunResult::worker_faults`] and described in
    /// [`RunResult::note`].
    pub fn run(&mut self) -> Result<RunResult, BenchError> {
        self.phase = RunPhase::Idle;
        let config = self.config.clone();

        if let Err(e) = validate_config(&config) {
            return Err(self.fail(BenchError::InvalidConfig(format!("{:#}", e))));
        }

        self.transition(RunPhase::Opening);
        let target = match open_target_with(
            &config.path,
            config.test_type.is_write(),
            config.direct,
            config.file_size,
            self.opener,
        ) {
            Ok(target) => target,
            Err(e) => return Err(self.fail(e)),
        };

        let state = RunState::new();
        let measurement = match self.drive_workers(&config, target.fd(), &state) {
            Ok(m) => m,
            Err(e) => return Err(self.fail(e)),
        };

        let mut notes = Vec::new();

        let faults: Vec<(usize, &WorkerFault)> = measurement
            .outcomes
            .iter()
            .filter_map(|o| match &o.status {
                WorkerStatus::Faulted(fault) => Some((o.id, fault)),
                WorkerStatus::Stopped => None,
            })
            .collect();

        if !faults.is_empty() {
            let details: Vec<String> = faults
                .iter()
                .map(|(id, fault)| format!("worker {}: {}", id, fault))
                .collect();
            notes.push(format!(
                "{} of {} workers stopped early ({})",
                faults.len(),
                config.queue_depth,
                details.join(", ")
            ));
        }

        if config.test_type.is_write() {
            if let Err(e) = target.sync_data() {
                warn!(path = %target.path().display(), error = %e, "data sync failed");
                notes.push(format!("data sync failed: {}", e));
            }
        }

        let io_engine_description = target.engine_description(measurement.engine_name);
        let io_mode = target.mode();
        drop(target);

        let mut latency = LatencyHistogram::new();
        for outcome in &measurement.outcomes {
            if let Err(e) = latency.merge(&outcome.latency) {
                warn!(worker = outcome.id, error = %e, "dropping worker latency samples");
            }
        }

        let total_ops = measurement.measured_ops;
        let total_bytes = total_ops * config.block_size;
        let averages = aggregate(total_bytes, total_ops, config.duration_secs);

        let result = RunResult {
            avg_throughput_mbps: averages.avg_throughput_mbps,
            avg_iops: averages.avg_iops,
            latency: LatencySummary::from_histogram(&latency),
            total_bytes,
            total_ops,
            io_engine_description,
            io_mode,
            series: measurement.series,
            note: notes.join("; "),
            worker_faults: faults.len(),
        };

        self.transition(RunPhase::Finalized);
        info!(
            mbps = result.avg_throughput_mbps,
            iops = result.avg_iops,
            total_ops = result.total_ops,
            faults = result.worker_faults,
            "run finalized"
        );

        Ok(result)
    }

    /// Spawn the workers, warm up, sample, then stop and join them
    fn drive_workers(
        &mut self,
        config: &BenchConfig,
        fd: std::os::unix::io::RawFd,
        state: &RunState,
    ) -> Result<Measurement, BenchError> {
        let pattern = config.test_type.access_pattern();
        let op_type = config.test_type.operation();

        thread::scope(|s| {
            // Dropped before the scope joins, so workers stop even if this thread unwinds
            let _stop = state.stop_on_drop();
            let mut handles = Vec::with_capacity(config.queue_depth);
            let mut engine_name = "";

            // Worker ids start at 1; id 0 would give a zero RNG seed
            for id in 1..=config.queue_depth {
                let engine = (self.engine_factory)();
                engine_name = engine.name();
                let worker = Worker::new(
                    id,
                    pattern,
                    op_type,
                    config.block_size,
                    config.file_size,
                    fd,
                    engine,
                );

                let spawned = thread::Builder::new()
                    .name(format!("worker-{}", id))
                    .spawn_scoped(s, move || worker.run(state));

                match spawned {
                    Ok(handle) => handles.push((id, handle)),
                    Err(source) => {
                        // Already-running workers are stopped by the guard and joined by the scope
                        return Err(BenchError::Spawn { worker_id: id, source });
                    }
                }
            }

            self.transition(RunPhase::Warming);
            let warmup_start = MonotonicInstant::now();
            sleep_until(warmup_start.offset_by(Duration::from_secs(config.warmup_secs)));

            // Latency window opens before and closes before the counter snapshots,
            // so both cover the same transfers up to one in flight per worker
            if config.duration_secs > 0 {
                state.begin_measuring();
            }
            let baseline_bytes = state.total_bytes();
            let baseline_ops = state.total_ops();
            self.transition(RunPhase::Measuring);

            let measure_start = MonotonicInstant::now();
            let observer = &mut self.observer;
            let series = Sampler::new(state, baseline_bytes).run(
                measure_start,
                config.duration_secs,
                |point| {
                    if let Some(observer) = observer.as_mut() {
                        observer(point);
                    }
                },
            );

            state.end_measuring();
            let end_ops = state.total_ops();
            state.request_stop();
            self.transition(RunPhase::Draining);

            let outcomes = handles
                .into_iter()
                .map(|(id, handle)| {
                    handle.join().unwrap_or_else(|_| WorkerOutcome {
                        id,
                        status: WorkerStatus::Faulted(WorkerFault::Panicked),
                        ops: 0,
                        latency: LatencyHistogram::new(),
                    })
                })
                .collect();

            let measured_ops = if config.duration_secs == 0 {
                0
            } else {
                end_ops.saturating_sub(baseline_ops)
            };

            Ok(Measurement {
                series,
                measured_ops,
                outcomes,
                engine_name,
            })
        })
    }
}

/// Run one benchmark with the default engine and no live observer
pub fn run_benchmark(config: &BenchConfig) -> Result<RunResult, BenchError> {
    RunController::new(config.clone()).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TestType;
    use crate::engine::mock::MockEngine;
    use crate::target::IoMode;
    use std::path::Path;
    use tempfile::TempDir;

    const MIB: u64 = 1024 * 1024;

    fn config(path: &Path, test_type: TestType) -> BenchConfig {
        let mut config = BenchConfig::new(path, test_type);
        config.file_size = 8 * MIB;
        config.block_size = 4096;
        config.queue_depth = 2;
        config.duration_secs = 1;
        config.warmup_secs = 0;
        config
    }

    #[test]
    fn test_seq_write_three_seconds() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(&temp_dir.path().join("bench.bin"), TestType::SeqWrite);
        cfg.file_size = 64 * MIB;
        cfg.queue_depth = 4;
        cfg.duration_secs = 3;

        let mut controller = RunController::new(cfg);
        let result = controller.run().unwrap();

        assert_eq!(controller.phase(), RunPhase::Finalized);
        assert_eq!(result.series.len(), 3);
        for (i, point) in result.series.iter().enumerate() {
            assert_eq!(point.second_index, i as u32);
            assert!(point.megabytes_per_second >= 0.0);
        }
        assert_eq!(result.total_bytes % 4096, 0);
        assert_eq!(result.total_ops * 4096, result.total_bytes);
        assert_eq!(result.avg_iops, result.total_ops as f64 / 3.0);
        assert_eq!(
            result.avg_throughput_mbps,
            result.total_bytes as f64 / 1_048_576.0 / 3.0
        );
        assert_eq!(result.worker_faults, 0);
        assert!(result.note.is_empty());
        assert!(result.total_ops > 0);
        assert!(result.latency.samples > 0);
        assert!(result.latency.samples.abs_diff(result.total_ops) <= 2 * 4);
        assert!(result.latency.p99_ms >= result.latency.p50_ms);
        assert_eq!(result.io_mode, IoMode::Buffered);
        assert_eq!(result.io_engine_description, "pread/pwrite, buffered");
    }

    #[test]
    fn test_zero_duration() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(&temp_dir.path().join("zero.bin"), TestType::RandWrite);
        cfg.duration_secs = 0;

        let result = run_benchmark(&cfg).unwrap();

        assert!(result.series.is_empty());
        assert_eq!(result.avg_throughput_mbps, 0.0);
        assert_eq!(result.avg_iops, 0.0);
        assert_eq!(result.total_bytes, 0);
        assert_eq!(result.total_ops, 0);
    }

    #[test]
    fn test_read_missing_file_fails_before_workers() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = config(&temp_dir.path().join("missing.bin"), TestType::SeqRead);

        let spawned = std::cell::Cell::new(0);
        let mut controller = RunController::new(cfg).with_engine_factory(|| {
            spawned.set(spawned.get() + 1);
            Box::new(MockEngine::new())
        });

        let err = controller.run().unwrap_err();
        assert!(matches!(err, BenchError::Open { .. }));
        assert!(err.is_init_error());
        assert_eq!(controller.phase(), RunPhase::Failed);
        assert_eq!(spawned.get(), 0);
    }

    #[test]
    fn test_invalid_config_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(&temp_dir.path().join("bad.bin"), TestType::SeqWrite);
        cfg.queue_depth = 0;

        let mut controller = RunController::new(cfg);
        let err = controller.run().unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfig(_)));
        assert_eq!(controller.phase(), RunPhase::Failed);
    }

    #[test]
    fn test_worker_faults_reported_in_note() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(&temp_dir.path().join("faults.bin"), TestType::SeqWrite);
        cfg.queue_depth = 3;

        let mut controller = RunController::new(cfg)
            .with_engine_factory(|| Box::new(MockEngine::new().fail_after(10)));
        let result = controller.run().unwrap();

        assert_eq!(controller.phase(), RunPhase::Finalized);
        assert_eq!(result.worker_faults, 3);
        assert!(result.note.starts_with("3 of 3 workers stopped early"));
        assert!(result.note.contains("worker 2: write at offset 40960 failed"));
        assert_eq!(result.series.len(), 1);
        assert_eq!(result.io_engine_description, "mock, buffered");
    }

    #[test]
    fn test_seq_read_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("read.bin");
        std::fs::write(&path, vec![0xA5u8; MIB as usize]).unwrap();

        let mut cfg = config(&path, TestType::SeqRead);
        cfg.file_size = MIB;

        let result = run_benchmark(&cfg).unwrap();
        assert_eq!(result.worker_faults, 0);
        assert!(result.total_ops > 0);
        assert_eq!(result.total_ops * 4096, result.total_bytes);
    }

    #[test]
    fn test_direct_request_falls_back_or_engages() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(&temp_dir.path().join("direct.bin"), TestType::RandWrite);
        cfg.direct = true;

        let result = run_benchmark(&cfg).unwrap();
        assert_eq!(result.series.len(), 1);
        match result.io_mode {
            IoMode::Direct => assert_eq!(result.io_engine_description, "pread/pwrite, O_DIRECT"),
            IoMode::Buffered => assert_eq!(
                result.io_engine_description,
                "pread/pwrite, buffered (O_DIRECT unavailable)"
            ),
        }
    }

    fn reject_direct(path: &Path, for_write: bool, direct: bool) -> std::io::Result<std::fs::File> {
        if direct {
            return Err(std::io::Error::from_raw_os_error(libc::EINVAL));
        }
        open_file(path, for_write, false)
    }

    #[test]
    fn test_unsupported_direct_still_completes() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(&temp_dir.path().join("fallback.bin"), TestType::RandWrite);
        cfg.direct = true;

        let mut controller = RunController::new(cfg).with_opener(reject_direct);
        let result = controller.run().unwrap();

        assert_eq!(controller.phase(), RunPhase::Finalized);
        assert_eq!(result.io_mode, IoMode::Buffered);
        assert_eq!(
            result.io_engine_description,
            "pread/pwrite, buffered (O_DIRECT unavailable)"
        );
        assert_eq!(result.series.len(), 1);
        assert_eq!(result.worker_faults, 0);
        assert!(result.total_ops > 0);
    }

    #[test]
    fn test_oversized_duration_rejected_before_open() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("long.bin");
        let mut cfg = config(&path, TestType::SeqWrite);
        cfg.duration_secs = 1 << 60;

        let mut controller = RunController::new(cfg);
        let err = controller.run().unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfig(_)));
        assert_eq!(controller.phase(), RunPhase::Failed);
        assert!(!path.exists());
    }

    #[test]
    fn test_observer_panic_stops_workers() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = config(&temp_dir.path().join("panic.bin"), TestType::SeqWrite);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            RunController::new(cfg)
                .with_observer(|_| panic!("observer failed"))
                .run()
        }));

        assert!(outcome.is_err());
    }

    #[test]
    fn test_observer_sees_every_point() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(&temp_dir.path().join("observed.bin"), TestType::SeqWrite);
        cfg.duration_secs = 2;

        let mut seen = Vec::new();
        let result = RunController::new(cfg)
            .with_observer(|p| seen.push(*p))
            .run()
            .unwrap();

        assert_eq!(seen, result.series);
    }

    #[test]
    fn test_warmup_excluded_from_totals() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(&temp_dir.path().join("warm.bin"), TestType::SeqWrite);
        cfg.warmup_secs = 1;
        cfg.duration_secs = 0;

        let mut controller = RunController::new(cfg);
        let result = controller.run().unwrap();
        assert_eq!(result.total_ops, 0);
        assert_eq!(result.latency.samples, 0);
        assert_eq!(controller.phase(), RunPhase::Finalized);
    }
}
