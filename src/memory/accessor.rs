//! Memory access to a live process through procfs

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use crate::memory::regions::RegionEnumerator;
use crate::memory::{ProcessMemory, RegionIter};
use crate::process::ProcessHandle;
use tracing::{debug, info};

/// Owns the handle to an attached process's memory
#[derive(Debug, Default)]
pub struct MemoryAccessor {
    handle: Option<ProcessHandle>,
}

impl MemoryAccessor {
    /// A detached accessor
    pub fn new() -> Self {
        MemoryAccessor { handle: None }
    }

    /// An accessor attached to `pid`
    pub fn attached(pid: ProcessId) -> MemoryResult<Self> {
        let mut accessor = Self::new();
        accessor.attach(pid)?;
        Ok(accessor)
    }

    pub fn pid(&self) -> Option<ProcessId> {
        self.handle.as_ref().map(ProcessHandle::pid)
    }

    pub fn handle(&self) -> Option<&ProcessHandle> {
        self.handle.as_ref()
    }

    fn require_handle(&self) -> MemoryResult<&ProcessHandle> {
        self.handle.as_ref().ok_or(MemoryError::NotAttached)
    }
}

impl ProcessMemory for MemoryAccessor {
    fn attach(&mut self, pid: ProcessId) -> MemoryResult<()> {
        let handle = ProcessHandle::open_for_read_write(pid)?;
        if let Some(previous) = self.handle.take() {
            debug!("Releasing previous attachment to {}", previous.pid());
        }
        info!(
            "Attached to process {} ({:?})",
            handle.pid(),
            handle.access()
        );
        self.handle = Some(handle);
        Ok(())
    }

    fn detach(&mut self) {
        if let Some(handle) = self.handle.take() {
            info!("Detached from process {}", handle.pid());
        }
    }

    fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    fn regions(&self) -> MemoryResult<RegionIter<'_>> {
        let pid = self.require_handle()?.pid();
        Ok(Box::new(RegionEnumerator::open(pid)?))
    }

    fn read_bytes(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
        self.require_handle()?.read_memory(address, buffer)
    }

    /// Writes go through `/proc/<pid>/mem`, which ignores page protection, so
    /// the range must lie inside a single writable mapping.
    fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        let handle = self.require_handle()?;
        let end = address
            .checked_add(data.len() as u64)
            .ok_or_else(|| MemoryError::write_failed(address, "address range overflows"))?;
        let writable = RegionEnumerator::open(handle.pid())?
            .find(|region| region.contains(address))
            .map_or(false, |region| region.is_writable() && end <= region.end);
        if !writable {
            return Err(MemoryError::write_failed(address, "region is not writable"));
        }

        handle.write_memory(address, data).map_err(|e| match e {
            MemoryError::PermissionDenied(reason) => MemoryError::write_failed(address, reason),
            other => other,
        })
    }
}
