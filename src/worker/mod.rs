//! Worker thread implementation
//!
//! A worker is one unit of queue depth: a thread that issues block-sized
//! positioned reads or writes back to back until the run's stop flag is raised.
//! Every full transfer is added to the shared [`RunState`] counters.
//!
//! # Lifecycle
//!
//! 1. **Creation**: [`Worker::new`] on the controlling thread
//! 2. **Execution**: [`Worker::run`] on the worker's own thread
//! 3. **Completion**: a [`WorkerOutcome`] returned through the join handle
//!
//! A failed or short transfer ends the worker's loop. That is not an error for
//! the run as a whole: the worker reports [`WorkerStatus::Faulted`] and the
//! others keep going.
//!
//! # Example
//!
//! ```
//! use storagebench::distribution::AccessPattern;
//! use storagebench::engine::{mock::MockEngine, OperationType};
//! use storagebench::run::state::RunState;
//! use storagebench::worker::{Worker, WorkerStatus};
//!
//! let state = RunState::new();
//! let engine = MockEngine::new().fail_after(10);
//! let worker = Worker::new(1, AccessPattern::Sequential, OperationType::Write, 4096, 1 << 20, 3, Box::new(engine));
//!
//! let outcome = worker.run(&state);
//! assert_eq!(outcome.ops, 10);
//! assert!(matches!(outcome.status, WorkerStatus::Faulted(_)));
//! ```

use crate::distribution::{AccessPattern, OffsetGenerator};
use crate::engine::{IOEngine, IOOperation, OperationType};
use crate::run::state::RunState;
use crate::stats::LatencyHistogram;
use crate::util::buffer::AlignedBuffer;
use crate::util::clock::MonotonicInstant;
use std::os::unix::io::RawFd;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a worker stopped before the stop flag was raised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerFault {
    #[error("{op} at offset {offset} failed: {message}")]
    Io {
        op: OperationType,
        offset: u64,
        message: String,
    },

    #[error("short {op} at offset {offset}: {transferred} of {expected} bytes")]
    ShortTransfer {
        op: OperationType,
        offset: u64,
        expected: usize,
        transferred: usize,
    },

    #[error("block buffer unavailable: {0}")]
    Buffer(String),

    #[error("worker thread panicked")]
    Panicked,
}

/// How a worker's loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Observed the stop flag
    Stopped,

    /// Left the loop after a failed or short transfer
    Faulted(WorkerFault),
}

/// What a worker hands back at join time
#[derive(Debug)]
pub struct WorkerOutcome {
    pub id: usize,
    pub status: WorkerStatus,

    /// Full transfers completed over the worker's whole life (warmup included)
    pub ops: u64,

    /// Latencies of transfers completed while the run was measuring
    pub latency: LatencyHistogram,
}

/// Worker thread state
pub struct Worker {
    id: usize,
    op_type: OperationType,
    block_size: u64,
    fd: RawFd,
    offsets: OffsetGenerator,
    engine: Box<dyn IOEngine>,
}

impl Worker {
    /// Create a worker
    ///
    /// `id` also seeds the worker's random offset stream, so the same id walks
    /// the same offsets in every run.
    pub fn new(
        id: usize,
        pattern: AccessPattern,
        op_type: OperationType,
        block_size: u64,
        file_size: u64,
        fd: RawFd,
        engine: Box<dyn IOEngine>,
    ) -> Self {
        Self {
            id,
            op_type,
            block_size,
            fd,
            offsets: OffsetGenerator::new(pattern, block_size, file_size, id),
            engine,
        }
    }

    /// Run the transfer loop until the stop flag is raised or a transfer faults
    pub fn run(mut self, state: &RunState) -> WorkerOutcome {
        let length = self.block_size as usize;

        let mut latency = LatencyHistogram::new();
        let mut ops = 0u64;

        // Aligned even in buffered mode; the open may have fallen back from O_DIRECT
        let mut buffer = match AlignedBuffer::for_block(length) {
            Ok(buffer) => buffer,
            Err(e) => {
                let fault = WorkerFault::Buffer(format!("{:#}", e));
                warn!(worker = self.id, %fault, "worker could not start");
                return WorkerOutcome {
                    id: self.id,
                    status: WorkerStatus::Faulted(fault),
                    ops,
                    latency,
                };
            }
        };
        if self.op_type == OperationType::Write {
            buffer.fill_write_pattern();
        }

        debug!(worker = self.id, op = %self.op_type, "worker started");

        let status = loop {
            if state.should_stop() {
                break WorkerStatus::Stopped;
            }

            let offset = self.offsets.next_offset();
            let op = IOOperation {
                op_type: self.op_type,
                target_fd: self.fd,
                offset,
                length,
            };

            let start = MonotonicInstant::now();
            match self.engine.execute(&op, buffer.as_mut_slice()) {
                Ok(n) if n == length => {}
                Ok(n) => {
                    break WorkerStatus::Faulted(WorkerFault::ShortTransfer {
                        op: self.op_type,
                        offset,
                        expected: length,
                        transferred: n,
                    });
                }
                Err(e) => {
                    break WorkerStatus::Faulted(WorkerFault::Io {
                        op: self.op_type,
                        offset,
                        message: format!("{:#}", e),
                    });
                }
            }
            let elapsed = start.elapsed();

            if state.is_measuring() {
                latency.record(elapsed);
            }
            state.record_transfer(self.block_size);
            ops += 1;
        };

        match &status {
            WorkerStatus::Stopped => debug!(worker = self.id, ops, "worker stopped"),
            WorkerStatus::Faulted(fault) => {
                warn!(worker = self.id, ops, %fault, "worker stopped on transfer fault")
            }
        }

        WorkerOutcome {
            id: self.id,
            status,
            ops,
            latency,
        }
    }
}
