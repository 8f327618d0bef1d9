//! memscan: find and narrow down values in the memory of a live Linux process
//!
//! Attach a [`ScanEngine`] to a pid, scan for a value, let the target change
//! that value, then scan again for the new one. Each scan after the first
//! only re-reads the surviving candidates.

pub mod config;
pub mod core;
pub mod logging;
pub mod memory;
pub mod process;

// Re-export main types from core module
pub use core::types::{
    Address, MemoryError, MemoryResult, ProcessId, ScanQuery, ScanSession, ScanValue,
    TrackedValue, TypeKind,
};

pub use config::{load_config, Config};
pub use logging::init_logging;
pub use memory::{
    CancellationToken, EngineState, MemoryAccessor, MemoryRegion, ProcessMemory, ScanEngine,
    ScanProgress, SimulatedProcess,
};
pub use process::{ProcessDirectory, ProcessInfo};
