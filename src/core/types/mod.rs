//! Core type definitions for memscan
//!
//! Addresses, scalar value kinds with their codecs, tracked candidates,
//! scan sessions and the error type shared by every module.

mod address;
mod error;
mod session;
mod tracked;
mod value;

// Re-export all public types
pub use address::Address;
pub use error::{MemoryError, MemoryResult};
pub use session::{ScanQuery, ScanSession};
pub use tracked::TrackedValue;
pub use value::{ScanValue, TypeKind};

// Common type aliases
pub type ProcessId = u32;
