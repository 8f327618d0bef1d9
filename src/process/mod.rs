//! Process management functionality for Linux
//!
//! This module provides process enumeration through `/proc`, process
//! information retrieval, and the owned handle to a process's memory.

pub mod enumerator;
pub mod handle;
pub mod info;

pub use enumerator::{enumerate_processes, find_processes_by_name, ProcessDirectory, ProcessEnumerator};
pub use handle::{ProcessAccess, ProcessHandle};
pub use info::ProcessInfo;
