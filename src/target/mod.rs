//! Benchmark target
//!
//! The target is a single regular file shared by every worker of a run. It is
//! opened once by the run controller, handed to workers as a raw descriptor for
//! positioned IO, and synced and closed after the workers have joined.

use serde::{Deserialize, Serialize};

pub mod file;

pub use file::{open_file, open_target, open_target_with, OpenFn, OpenedTarget};

/// IO mode the target was actually opened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoMode {
    /// Page cache bypassed (`O_DIRECT`)
    Direct,

    /// Regular page-cache IO
    Buffered,
}

impl std::fmt::Display for IoMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoMode::Direct => write!(f, "direct"),
            IoMode::Buffered => write!(f, "buffered"),
        }
    }
}
