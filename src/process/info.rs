//! Process information types

use crate::core::types::ProcessId;
use serde::{Deserialize, Serialize};

/// Information about a running process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    /// Short command name from `/proc/<pid>/comm`
    pub name: String,
    /// Full command line, arguments joined by spaces
    pub cmdline: Option<String>,
}

impl ProcessInfo {
    /// Creates a new ProcessInfo with minimal information
    pub fn new(pid: ProcessId, name: impl Into<String>) -> Self {
        ProcessInfo {
            pid,
            name: name.into(),
            cmdline: None,
        }
    }

    /// Substring match against the command name, then the command line
    pub fn name_matches(&self, needle: &str) -> bool {
        self.name.contains(needle)
            || self
                .cmdline
                .as_deref()
                .map_or(false, |cmdline| cmdline.contains(needle))
    }
}
