//! Core module containing fundamental types for memscan
//!
//! This module provides the foundational building blocks used throughout
//! the crate: address handling, scalar value codecs, tracked candidates,
//! scan sessions and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, MemoryError, MemoryResult, ProcessId, ScanQuery, ScanSession, ScanValue,
    TrackedValue, TypeKind,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

// Platform verification at compile time
#[cfg(not(target_os = "linux"))]
compile_error!("memscan reads process memory through /proc and only supports Linux");
