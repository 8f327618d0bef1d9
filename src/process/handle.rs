//! Safe process memory handle with RAII semantics

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;

/// Access mode the handle was opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessAccess {
    ReadOnly,
    ReadWrite,
}

/// Owned handle to `/proc/<pid>/mem`.
///
/// The file is closed when the handle is dropped. Reads and writes are
/// positioned (`pread`/`pwrite`), so a shared reference can be used from
/// several threads at once.
pub struct ProcessHandle {
    file: File,
    pid: ProcessId,
    access: ProcessAccess,
}

impl ProcessHandle {
    /// Open a process with the specified access
    pub fn open(pid: ProcessId, access: ProcessAccess) -> MemoryResult<Self> {
        let proc_dir = format!("/proc/{}", pid);
        if pid == 0 || !Path::new(&proc_dir).exists() {
            return Err(MemoryError::ProcessNotFound(pid.to_string()));
        }

        let path = format!("{}/mem", proc_dir);
        let file = OpenOptions::new()
            .read(true)
            .write(access == ProcessAccess::ReadWrite)
            .open(&path)
            .map_err(|e| open_error(pid, e))?;

        Ok(ProcessHandle { file, pid, access })
    }

    /// Open for reading and writing, falling back to read-only when write
    /// access is refused
    pub fn open_for_read_write(pid: ProcessId) -> MemoryResult<Self> {
        match Self::open(pid, ProcessAccess::ReadWrite) {
            Err(MemoryError::PermissionDenied(_)) => Self::open(pid, ProcessAccess::ReadOnly),
            other => other,
        }
    }

    pub fn open_for_read(pid: ProcessId) -> MemoryResult<Self> {
        Self::open(pid, ProcessAccess::ReadOnly)
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn access(&self) -> ProcessAccess {
        self.access
    }

    pub fn is_writable(&self) -> bool {
        self.access == ProcessAccess::ReadWrite
    }

    /// Fills `buffer` from `address`; a short read is an error
    pub fn read_memory(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
        let mut filled = 0;
        while filled < buffer.len() {
            let at = address.as_u64() + filled as u64;
            match self.file.read_at(&mut buffer[filled..], at) {
                Ok(0) => {
                    return Err(MemoryError::read_failed(
                        address,
                        format!("short read ({} of {} bytes)", filled, buffer.len()),
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MemoryError::read_failed(address, e.to_string())),
            }
        }
        Ok(())
    }

    /// Writes all of `data` at `address`
    pub fn write_memory(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        if !self.is_writable() {
            return Err(MemoryError::PermissionDenied(format!(
                "process {} was opened read-only",
                self.pid
            )));
        }

        let mut written = 0;
        while written < data.len() {
            let at = address.as_u64() + written as u64;
            match self.file.write_at(&data[written..], at) {
                Ok(0) => {
                    return Err(MemoryError::write_failed(
                        address,
                        format!("short write ({} of {} bytes)", written, data.len()),
                    ))
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MemoryError::write_failed(address, e.to_string())),
            }
        }
        Ok(())
    }
}

fn open_error(pid: ProcessId, error: io::Error) -> MemoryError {
    match error.kind() {
        io::ErrorKind::NotFound => MemoryError::ProcessNotFound(pid.to_string()),
        io::ErrorKind::PermissionDenied => MemoryError::PermissionDenied(format!(
            "cannot open memory of process {}: {}",
            pid, error
        )),
        _ => MemoryError::IoError(error),
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("access", &self.access)
            .finish()
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessHandle(pid={}, access={:?})", self.pid, self.access)
    }
}
