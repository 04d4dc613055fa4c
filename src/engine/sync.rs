//! Synchronous IO engine
//!
//! Uses blocking `pread`/`pwrite` syscalls. Positioned IO never moves the
//! shared file offset, so any number of workers can use the same descriptor
//! concurrently without locking.
//!
//! Each call issues one syscall attempt (restarted only on `EINTR`). Partial
//! transfers are returned as-is so the caller can detect them.

use super::{IOEngine, IOOperation, OperationType};
use crate::Result;
use anyhow::Context;

/// Synchronous IO engine using pread/pwrite
#[derive(Debug, Default)]
pub struct SyncEngine;

impl SyncEngine {
    pub fn new() -> Self {
        Self
    }

    #[inline(always)]
    fn do_read(&self, fd: i32, buffer: &mut [u8], length: usize, offset: u64) -> Result<usize> {
        loop {
            // SAFETY: buffer is a valid, exclusively borrowed slice of at least
            // `length` bytes (checked by the caller).
            let result = unsafe {
                libc::pread(
                    fd,
                    buffer.as_mut_ptr() as *mut libc::c_void,
                    length,
                    offset as libc::off_t,
                )
            };

            if result < 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err).context(format!(
                    "pread failed: fd={}, offset={}, length={}",
                    fd, offset, length
                ));
            }

            return Ok(result as usize);
        }
    }

    #[inline(always)]
    fn do_write(&self, fd: i32, buffer: &[u8], length: usize, offset: u64) -> Result<usize> {
        loop {
            // SAFETY: buffer is a valid slice of at least `length` bytes.
            let result = unsafe {
                libc::pwrite(
                    fd,
                    buffer.as_ptr() as *const libc::c_void,
                    length,
                    offset as libc::off_t,
                )
            };

            if result < 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err).context(format!(
                    "pwrite failed: fd={}, offset={}, length={}",
                    fd, offset, length
                ));
            }

            return Ok(result as usize);
        }
    }
}

impl IOEngine for SyncEngine {
    fn execute(&mut self, op: &IOOperation, buffer: &mut [u8]) -> Result<usize> {
        if buffer.len() < op.length {
            anyhow::bail!(
                "buffer too small: {} bytes for a {} byte transfer",
                buffer.len(),
                op.length
            );
        }

        match op.op_type {
            OperationType::Read => self.do_read(op.target_fd, buffer, op.length, op.offset),
            OperationType::Write => self.do_write(op.target_fd, buffer, op.length, op.offset),
        }
    }

    fn name(&self) -> &'static str {
        "pread/pwrite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{File, OpenOptions};
    use std::os::unix::io::AsRawFd;
    use tempfile::TempDir;

    #[test]
    fn test_sync_engine_read_at_offset() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test_offset.dat");

        let test_data = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        std::fs::write(&file_path, test_data).unwrap();

        let file = File::open(&file_path).unwrap();
        let mut engine = SyncEngine::new();

        let mut buffer = vec![0u8; 10];
        let op = IOOperation {
            op_type: OperationType::Read,
            target_fd: file.as_raw_fd(),
            offset: 10,
            length: 10,
        };

        assert_eq!(engine.execute(&op, &mut buffer).unwrap(), 10);
        assert_eq!(&buffer[..], b"ABCDEFGHIJ");
    }

    #[test]
    fn test_sync_engine_write() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test_write.dat");

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&file_path)
            .unwrap();

        let mut engine = SyncEngine::new();
        let mut data = b"Writing test data with synchronous engine!".to_vec();
        let op = IOOperation {
            op_type: OperationType::Write,
            target_fd: file.as_raw_fd(),
            offset: 4,
            length: data.len(),
        };

        assert_eq!(engine.execute(&op, &mut data).unwrap(), data.len());

        drop(file);
        let written = std::fs::read(&file_path).unwrap();
        assert_eq!(&written[..4], &[0, 0, 0, 0]);
        assert_eq!(&written[4..], &data[..]);
    }

    #[test]
    fn test_sync_engine_short_read_not_retried() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test_short.dat");
        std::fs::write(&file_path, b"Short").unwrap();

        let file = File::open(&file_path).unwrap();
        let mut engine = SyncEngine::new();

        let mut buffer = vec![0u8; 100];
        let op = IOOperation {
            op_type: OperationType::Read,
            target_fd: file.as_raw_fd(),
            offset: 0,
            length: 100,
        };

        assert_eq!(engine.execute(&op, &mut buffer).unwrap(), 5);

        // Entirely past EOF reads zero bytes
        let op = IOOperation { offset: 4096, ..op };
        assert_eq!(engine.execute(&op, &mut buffer).unwrap(), 0);
    }

    #[test]
    fn test_sync_engine_write_on_read_only_fd_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test_ro.dat");
        std::fs::write(&file_path, vec![0u8; 4096]).unwrap();

        let file = File::open(&file_path).unwrap();
        let mut engine = SyncEngine::new();
        let mut buffer = vec![1u8; 4096];
        let op = IOOperation {
            op_type: OperationType::Write,
            target_fd: file.as_raw_fd(),
            offset: 0,
            length: 4096,
        };

        let err = engine.execute(&op, &mut buffer).unwrap_err();
        assert!(err.to_string().contains("pwrite failed"));
    }

    #[test]
    fn test_sync_engine_invalid_fd() {
        let mut engine = SyncEngine::new();
        let mut buffer = vec![0u8; 100];
        let op = IOOperation {
            op_type: OperationType::Read,
            target_fd: -1,
            offset: 0,
            length: 100,
        };

        assert!(engine.execute(&op, &mut buffer).is_err());
    }

    #[test]
    fn test_sync_engine_buffer_too_small() {
        let mut engine = SyncEngine::new();
        let mut buffer = vec![0u8; 10];
        let op = IOOperation {
            op_type: OperationType::Read,
            target_fd: 0,
            offset: 0,
            length: 100,
        };

        assert!(engine.execute(&op, &mut buffer).is_err());
    }
}
