//! Benchmark target file
//!
//! Opening is a two-stage strategy: when direct IO is requested the file is
//! first opened with `O_DIRECT`; if the kernel or filesystem refuses, the open
//! is retried once in buffered mode. The mode that actually succeeded is kept
//! on the [`OpenedTarget`] and reported in the run result, so a fallback is
//! never mistaken for a direct-IO measurement.
//!
//! Write targets are created if missing and pre-sized to the configured length
//! with `posix_fallocate` (falling back to `ftruncate` through
//! [`File::set_len`]). Pre-sizing is best-effort: a failure is logged and the
//! run continues.
//!
//! # Example
//!
//! ```no_run
//! use storagebench::target::open_target;
//! use std::path::Path;
//!
//! let target = open_target(Path::new("/tmp/bench.bin"), true, true, 64 * 1024 * 1024)?;
//! println!("{} ({:?})", target.engine_description("pread/pwrite"), target.mode());
//! # Ok::<(), storagebench::error::BenchError>(())
//! ```

use super::IoMode;
use crate::error::BenchError;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Pre-allocations above this size get a progress log line
const LARGE_PREALLOCATION: u64 = 100 * 1024 * 1024;

/// Opens `path` for reading, or for writing when the second argument is set,
/// with `O_DIRECT` when the third argument is set
pub type OpenFn = fn(&Path, bool, bool) -> io::Result<File>;

/// An open target file and the IO mode it was opened in
#[derive(Debug)]
pub struct OpenedTarget {
    file: File,
    path: PathBuf,
    mode: IoMode,
    direct_requested: bool,
    for_write: bool,
    size: u64,
}

/// Open the benchmark target
///
/// * `for_write` - open read-write and create the file if missing; otherwise
///   open read-only
/// * `try_direct` - attempt `O_DIRECT` first, then fall back to buffered IO
/// * `target_size` - size write targets are pre-sized to
///
/// # Errors
///
/// Returns [`BenchError::Open`] only when the buffered attempt fails as well.
pub fn open_target(
    path: &Path,
    for_write: bool,
    try_direct: bool,
    target_size: u64,
) -> Result<OpenedTarget, BenchError> {
    open_target_with(path, for_write, try_direct, target_size, open_file)
}

/// [`open_target`] with a custom open call for both attempts
pub fn open_target_with(
    path: &Path,
    for_write: bool,
    try_direct: bool,
    target_size: u64,
    open: OpenFn,
) -> Result<OpenedTarget, BenchError> {
    let access = if for_write { "write" } else { "read" };

    let (file, mode) = match try_direct.then(|| open(path, for_write, true)) {
        Some(Ok(file)) => (file, IoMode::Direct),
        Some(Err(err)) => {
            warn!(
                path = %path.display(),
                error = %err,
                "direct IO open failed, falling back to buffered IO"
            );
            (open_buffered(open, path, for_write, access)?, IoMode::Buffered)
        }
        None => (open_buffered(open, path, for_write, access)?, IoMode::Buffered),
    };

    info!(path = %path.display(), access, mode = %mode, "target opened");

    let mut target = OpenedTarget {
        file,
        path: path.to_path_buf(),
        mode,
        direct_requested: try_direct,
        for_write,
        size: 0,
    };

    if for_write {
        target.presize(target_size);
    }

    target.size = target.current_len().unwrap_or(0);
    if !for_write && target.size < target_size {
        warn!(
            path = %path.display(),
            actual = target.size,
            expected = target_size,
            "read target is smaller than the configured file size; reads past the end will fault workers"
        );
    }

    Ok(target)
}

fn open_buffered(
    open: OpenFn,
    path: &Path,
    for_write: bool,
    access: &'static str,
) -> Result<File, BenchError> {
    open(path, for_write, false).map_err(|source| BenchError::Open {
        path: path.to_path_buf(),
        access,
        source,
    })
}

/// Default [`OpenFn`]: create-on-write with mode 0664, `O_DIRECT` where supported
pub fn open_file(path: &Path, for_write: bool, direct: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);

    if for_write {
        options.write(true).create(true).mode(0o664);
    }

    if direct {
        options.custom_flags(direct_flag()?);
    }

    options.open(path)
}

#[cfg(target_os = "linux")]
fn direct_flag() -> io::Result<i32> {
    Ok(libc::O_DIRECT)
}

#[cfg(not(target_os = "linux"))]
fn direct_flag() -> io::Result<i32> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "O_DIRECT is not available on this platform",
    ))
}

impl OpenedTarget {
    pub fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    /// The IO mode that was actually achieved
    pub fn mode(&self) -> IoMode {
        self.mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size observed right after opening (and pre-sizing)
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether direct IO was requested but could not be used
    pub fn fell_back(&self) -> bool {
        self.direct_requested && self.mode == IoMode::Buffered
    }

    /// Describe the transfer mechanism together with the achieved IO mode
    ///
    /// e.g. `"pread/pwrite, O_DIRECT"` or
    /// `"pread/pwrite, buffered (O_DIRECT unavailable)"`.
    pub fn engine_description(&self, engine: &str) -> String {
        match self.mode {
            IoMode::Direct => format!("{}, O_DIRECT", engine),
            IoMode::Buffered if self.fell_back() => {
                format!("{}, buffered (O_DIRECT unavailable)", engine)
            }
            IoMode::Buffered => format!("{}, buffered", engine),
        }
    }

    /// Force written data to stable storage (`fdatasync`)
    pub fn sync_data(&self) -> io::Result<()> {
        if !self.for_write {
            return Ok(());
        }
        self.file.sync_data()
    }

    fn current_len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Extend the file to `target_size` bytes, logging instead of failing
    fn presize(&self, target_size: u64) {
        let start = Instant::now();
        if target_size > LARGE_PREALLOCATION {
            info!(bytes = target_size, "pre-allocating target (this may take several seconds)");
        }

        match self.fallocate(target_size) {
            Ok(()) => {
                debug!(
                    bytes = target_size,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "pre-allocation complete"
                );
                return;
            }
            Err(err) => {
                debug!(error = %err, "posix_fallocate unavailable, extending with ftruncate");
            }
        }

        // set_len can also shrink; only ever grow here
        let result = match self.current_len() {
            Ok(len) if len >= target_size => Ok(()),
            Ok(_) => self.file.set_len(target_size),
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            warn!(
                path = %self.path.display(),
                bytes = target_size,
                error = %err,
                "pre-sizing failed; continuing without it"
            );
        }
    }

    #[cfg(target_os = "linux")]
    fn fallocate(&self, size: u64) -> io::Result<()> {
        let len = libc::off_t::try_from(size)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "file size exceeds off_t"))?;

        // SAFETY: fd is valid for the lifetime of self.file.
        let result = unsafe { libc::posix_fallocate(self.fd(), 0, len) };
        if result != 0 {
            return Err(io::Error::from_raw_os_error(result));
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn fallocate(&self, _size: u64) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}
