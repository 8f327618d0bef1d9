//! Memory region management for Linux processes
//!
//! Regions come from `/proc/<pid>/maps`. This module parses them, exposes
//! their permissions and labels, and filters them down to what a scan should
//! visit.

pub mod enumerator;
pub mod filter;
pub mod region;

pub use enumerator::{enumerate_regions, RegionEnumerator};
pub use filter::{presets, FilterCriteria, RegionFilter};
pub use region::{MemoryRegion, Permissions, PSEUDO_REGIONS};
