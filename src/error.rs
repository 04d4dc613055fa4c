//! Run-level error taxonomy
//!
//! Only failures that prevent a run from starting surface as errors. A worker
//! whose transfer fails mid-run is not an error here: it stops on its own and
//! is reported through the run result's note.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised before any measurement takes place
#[derive(Debug, Error)]
pub enum BenchError {
    /// The configuration violates a run invariant
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The target could not be opened, even after the buffered fallback
    #[error("failed to open {path} for {access}: {source}")]
    Open {
        path: PathBuf,
        access: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread could not be started
    #[error("failed to spawn worker {worker_id}: {source}")]
    Spawn {
        worker_id: usize,
        #[source]
        source: std::io::Error,
    },
}

impl BenchError {
    /// Whether the error happened while initializing IO (open or spawn)
    pub fn is_init_error(&self) -> bool {
        matches!(self, BenchError::Open { .. } | BenchError::Spawn { .. })
    }
}
