//! IO engine abstraction
//!
//! An IO engine performs one positioned transfer at a time on behalf of a
//! worker. The production engine ([`sync::SyncEngine`]) issues blocking
//! `pread`/`pwrite` syscalls; the [`mock::MockEngine`] performs no IO and is
//! used to drive worker logic deterministically in tests.
//!
//! # Contract
//!
//! [`IOEngine::execute`] issues exactly one transfer attempt and reports the
//! number of bytes actually moved. It never retries a short transfer: whether a
//! short count is acceptable is the caller's decision (workers treat it as a
//! fault and stop).
//!
//! # Example
//!
//! ```no_run
//! use storagebench::engine::{IOEngine, IOOperation, OperationType};
//! use storagebench::engine::sync::SyncEngine;
//! use std::os::unix::io::AsRawFd;
//!
//! let file = std::fs::File::open("/tmp/bench.bin")?;
//! let mut engine = SyncEngine::new();
//! let mut buffer = vec![0u8; 4096];
//!
//! let op = IOOperation {
//!     op_type: OperationType::Read,
//!     target_fd: file.as_raw_fd(),
//!     offset: 0,
//!     length: buffer.len(),
//! };
//! let transferred = engine.execute(&op, &mut buffer)?;
//! assert!(transferred <= 4096);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::Result;
use serde::{Deserialize, Serialize};
use std::os::unix::io::RawFd;

/// IO engine trait
///
/// Engines must be `Send` so each worker thread can own one. They are not
/// required to be `Sync`.
pub trait IOEngine: Send {
    /// Issue a single positioned transfer
    ///
    /// For reads the data lands in `buffer`; for writes `buffer` is the source.
    /// `buffer` must be at least `op.length` bytes long.
    ///
    /// # Errors
    ///
    /// Returns an error if the syscall fails. A short transfer is `Ok` with
    /// fewer bytes than requested.
    fn execute(&mut self, op: &IOOperation, buffer: &mut [u8]) -> Result<usize>;

    /// Short human-readable name of the transfer mechanism
    fn name(&self) -> &'static str;
}

/// Positioned IO operation descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IOOperation {
    /// Read or write
    pub op_type: OperationType,

    /// File descriptor of the target file
    pub target_fd: RawFd,

    /// Byte offset within the file
    pub offset: u64,

    /// Number of bytes to transfer
    pub length: usize,
}

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Read from the target into the buffer
    Read,

    /// Write the buffer to the target
    Write,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::Read => write!(f, "read"),
            OperationType::Write => write!(f, "write"),
        }
    }
}

pub mod mock;
pub mod sync;
