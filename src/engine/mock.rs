//! Mock IO engine for testing
//!
//! Simulates positioned transfers without touching the filesystem, so worker
//! logic (offset generation, fault handling, stop behavior) can be tested
//! deterministically.
//!
//! # Features
//!
//! - Records every executed operation for verification
//! - Can start failing after a given number of operations
//! - Can start returning short transfers after a given number of operations
//! - Clones share state, so a test can keep a handle after moving the engine
//!   into a worker
//!
//! # Example
//!
//! ```
//! use storagebench::engine::{IOEngine, IOOperation, OperationType};
//! use storagebench::engine::mock::MockEngine;
//!
//! let mut engine = MockEngine::new();
//! let handle = engine.clone();
//!
//! let op = IOOperation {
//!     op_type: OperationType::Read,
//!     target_fd: 3,
//!     offset: 8192,
//!     length: 4096,
//! };
//! let mut buffer = vec![0u8; 4096];
//! assert_eq!(engine.execute(&op, &mut buffer).unwrap(), 4096);
//! assert_eq!(handle.executed_offsets(), vec![8192]);
//! ```

use super::{IOEngine, IOOperation, OperationType};
use crate::Result;
use std::sync::{Arc, Mutex, MutexGuard};

/// Record of an executed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub op_type: OperationType,
    pub target_fd: i32,
    pub offset: u64,
    pub length: usize,
}

/// Failure injection settings
#[derive(Debug, Clone, Copy, Default)]
struct Behavior {
    /// Operations succeed until this many have been executed, then error
    fail_after: Option<usize>,

    /// Operations transfer the full length until this many have been executed,
    /// then transfer `short_bytes`
    short_after: Option<(usize, usize)>,
}

/// Mock IO engine
#[derive(Clone, Default)]
pub struct MockEngine {
    behavior: Arc<Mutex<Behavior>>,
    executed: Arc<Mutex<Vec<OperationRecord>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockEngine {
    /// Create an engine that completes every operation in full
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every operation after the first `ops` have succeeded
    pub fn fail_after(self, ops: usize) -> Self {
        lock(&self.behavior).fail_after = Some(ops);
        self
    }

    /// Transfer only `bytes` per operation after the first `ops` complete in full
    pub fn short_after(self, ops: usize, bytes: usize) -> Self {
        lock(&self.behavior).short_after = Some((ops, bytes));
        self
    }

    /// All executed operations, in order
    pub fn executed_operations(&self) -> Vec<OperationRecord> {
        lock(&self.executed).clone()
    }

    /// Offsets of all executed operations, in order
    pub fn executed_offsets(&self) -> Vec<u64> {
        lock(&self.executed).iter().map(|r| r.offset).collect()
    }

    pub fn executed_count(&self) -> usize {
        lock(&self.executed).len()
    }
}

impl IOEngine for MockEngine {
    fn execute(&mut self, op: &IOOperation, buffer: &mut [u8]) -> Result<usize> {
        if buffer.len() < op.length {
            anyhow::bail!(
                "buffer too small: {} bytes for a {} byte transfer",
                buffer.len(),
                op.length
            );
        }

        let behavior = *lock(&self.behavior);
        let mut executed = lock(&self.executed);
        let index = executed.len();

        executed.push(OperationRecord {
            op_type: op.op_type,
            target_fd: op.target_fd,
            offset: op.offset,
            length: op.length,
        });

        if let Some(limit) = behavior.fail_after {
            if index >= limit {
                anyhow::bail!("mock {} failed at offset {}", op.op_type, op.offset);
            }
        }

        if let Some((limit, bytes)) = behavior.short_after {
            if index >= limit {
                return Ok(bytes.min(op.length));
            }
        }

        Ok(op.length)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
