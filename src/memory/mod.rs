//! Memory operations module for reading, writing and scanning process memory
//!
//! This module provides:
//! - The `ProcessMemory` trait, the seam every scan runs against
//! - `MemoryAccessor`, backed by `/proc/<pid>/mem` and `/proc/<pid>/maps`
//! - `SimulatedProcess`, an in-memory process image
//! - Region enumeration and filtering
//! - The scan/cull engine

pub mod accessor;
pub mod regions;
pub mod scanner;
pub mod simulated;

pub use accessor::MemoryAccessor;
pub use regions::{FilterCriteria, MemoryRegion, Permissions, RegionEnumerator, RegionFilter};
pub use scanner::{CancellationToken, EngineState, ScanEngine, ScanProgress};
pub use simulated::SimulatedProcess;

use crate::core::types::{Address, MemoryResult, ProcessId, ScanValue, TypeKind};
use tracing::{debug, trace};

/// Boxed region sequence; consumed once
pub type RegionIter<'a> = Box<dyn Iterator<Item = MemoryRegion> + 'a>;

/// Typed access to the memory of one attached process.
///
/// Reads take `&self` and must be safe to issue from several threads at once.
pub trait ProcessMemory: Send + Sync {
    /// Attach to `pid`, releasing any previous attachment once the new one
    /// is open. On failure the previous attachment is kept.
    fn attach(&mut self, pid: ProcessId) -> MemoryResult<()>;

    /// Release the attachment; a no-op when not attached
    fn detach(&mut self);

    fn is_attached(&self) -> bool;

    /// Every mapping of the attached process, unfiltered
    fn regions(&self) -> MemoryResult<RegionIter<'_>>;

    /// Fill `buffer` from `address`; partial reads are errors
    fn read_bytes(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<()>;

    fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()>;

    /// Mappings a scan may visit: readable and not a kernel pseudo-region
    fn enumerate_regions(&self) -> MemoryResult<RegionIter<'_>> {
        let filter = RegionFilter::default();
        Ok(Box::new(self.regions()?.filter(move |region| {
            let keep = filter.matches(region);
            if !keep {
                debug!("Skipping region {}", region);
            }
            keep
        })))
    }

    /// Read and decode one value of `kind`
    fn read(&self, address: Address, kind: TypeKind) -> MemoryResult<ScanValue> {
        let mut buffer = [0u8; 8];
        let slot = &mut buffer[..kind.size()];
        self.read_bytes(address, slot)?;
        kind.decode(slot)
    }

    /// Encode `value` as `kind` and write it
    fn write(&self, address: Address, kind: TypeKind, value: &ScanValue) -> MemoryResult<()> {
        let bytes = kind.encode(value)?;
        trace!("write {} {} <- {}", address, kind, hex::encode(&bytes));
        self.write_bytes(address, &bytes)
    }
}
