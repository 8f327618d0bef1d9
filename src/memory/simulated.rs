//! In-memory process image implementing `ProcessMemory`
//!
//! A `SimulatedProcess` holds a set of mapped regions with their bytes and
//! behaves like an attached process: reads outside a mapping, inside an
//! unreadable mapping, across a hole or from a kernel pseudo-region fail with
//! an access error, and writes require write permission. `poke` changes
//! memory the way the target program itself would, ignoring permissions.

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use crate::memory::regions::MemoryRegion;
use crate::memory::{ProcessMemory, RegionIter};
use std::sync::RwLock;

struct Mapping {
    region: MemoryRegion,
    bytes: RwLock<Vec<u8>>,
}

/// A fake process whose address space lives in this one
pub struct SimulatedProcess {
    pid: ProcessId,
    attached: bool,
    mappings: Vec<Mapping>,
    holes: Vec<(u64, u64)>,
}

impl SimulatedProcess {
    /// Pid reported by `SimulatedProcess::new`
    pub const DEFAULT_PID: ProcessId = 1;

    /// An attached, empty process with `DEFAULT_PID`
    pub fn new() -> Self {
        Self::with_pid(Self::DEFAULT_PID)
    }

    pub fn with_pid(pid: ProcessId) -> Self {
        SimulatedProcess {
            pid,
            attached: true,
            mappings: Vec::new(),
            holes: Vec::new(),
        }
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Maps `region` backed by `bytes`, padded or truncated to the region size
    pub fn map(&mut self, region: MemoryRegion, mut bytes: Vec<u8>) -> &mut Self {
        bytes.resize(region.size() as usize, 0);
        let at = self
            .mappings
            .partition_point(|m| m.region.start < region.start);
        self.mappings.insert(
            at,
            Mapping {
                region,
                bytes: RwLock::new(bytes),
            },
        );
        self
    }

    /// Removes the mapping starting at `start`, as a target freeing memory would
    pub fn unmap(&mut self, start: Address) -> bool {
        let before = self.mappings.len();
        self.mappings.retain(|m| m.region.start != start);
        self.mappings.len() != before
    }

    /// Makes `[start, start + len)` unreadable while the region stays mapped
    pub fn add_hole(&mut self, start: Address, len: u64) -> &mut Self {
        self.holes.push((start.as_u64(), start.as_u64().saturating_add(len)));
        self
    }

    /// Overwrites memory as the target program would, ignoring permissions
    pub fn poke(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        let mapping = self
            .mapping_for(address, data.len())
            .ok_or_else(|| MemoryError::write_failed(address, "address is not mapped"))?;
        let offset = (address.as_u64() - mapping.region.start.as_u64()) as usize;
        let mut bytes = mapping.bytes.write().unwrap_or_else(|e| e.into_inner());
        bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn mapping_for(&self, address: Address, len: usize) -> Option<&Mapping> {
        let end = address.as_u64().checked_add(len as u64)?;
        self.mappings
            .iter()
            .find(|m| m.region.contains(address) && end <= m.region.end.as_u64())
    }

    fn overlaps_hole(&self, address: Address, len: usize) -> bool {
        let start = address.as_u64();
        let end = start.saturating_add(len as u64);
        self.holes.iter().any(|&(lo, hi)| start < hi && lo < end)
    }

    fn require_attached(&self) -> MemoryResult<()> {
        if self.attached {
            Ok(())
        } else {
            Err(MemoryError::NotAttached)
        }
    }
}

impl Default for SimulatedProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessMemory for SimulatedProcess {
    fn attach(&mut self, pid: ProcessId) -> MemoryResult<()> {
        if pid != self.pid {
            return Err(MemoryError::ProcessNotFound(pid.to_string()));
        }
        self.attached = true;
        Ok(())
    }

    fn detach(&mut self) {
        self.attached = false;
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn regions(&self) -> MemoryResult<RegionIter<'_>> {
        self.require_attached()?;
        Ok(Box::new(self.mappings.iter().map(|m| m.region.clone())))
    }

    fn read_bytes(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
        self.require_attached()?;

        let mapping = self
            .mapping_for(address, buffer.len())
            .ok_or_else(|| MemoryError::read_failed(address, "address is not mapped"))?;
        if !mapping.region.is_readable() || mapping.region.is_pseudo() {
            return Err(MemoryError::read_failed(address, "region is not readable"));
        }
        if self.overlaps_hole(address, buffer.len()) {
            return Err(MemoryError::read_failed(address, "input/output error"));
        }

        let offset = (address.as_u64() - mapping.region.start.as_u64()) as usize;
        let bytes = mapping.bytes.read().unwrap_or_else(|e| e.into_inner());
        buffer.copy_from_slice(&bytes[offset..offset + buffer.len()]);
        Ok(())
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        self.require_attached()?;

        let mapping = self
            .mapping_for(address, data.len())
            .ok_or_else(|| MemoryError::write_failed(address, "address is not mapped"))?;
        if !mapping.region.is_writable() {
            return Err(MemoryError::write_failed(address, "region is not writable"));
        }
        if self.overlaps_hole(address, data.len()) {
            return Err(MemoryError::write_failed(address, "input/output error"));
        }

        self.poke(address, data)
    }
}
