//! Process enumeration over `/proc`

use crate::core::types::{MemoryError, MemoryResult, ProcessId};
use crate::process::info::ProcessInfo;
use std::fs::{self, ReadDir};

/// Iterates over the numeric entries of `/proc`.
///
/// Processes that exit while being inspected are skipped.
pub struct ProcessEnumerator {
    entries: ReadDir,
}

impl ProcessEnumerator {
    pub fn new() -> MemoryResult<Self> {
        Ok(ProcessEnumerator {
            entries: fs::read_dir("/proc")?,
        })
    }

    fn next_process(&mut self) -> Option<ProcessInfo> {
        for entry in self.entries.by_ref() {
            let Ok(entry) = entry else { continue };
            let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<ProcessId>().ok())
            else {
                continue;
            };

            if let Some(info) = read_process_info(pid) {
                return Some(info);
            }
        }
        None
    }
}

impl Iterator for ProcessEnumerator {
    type Item = ProcessInfo;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_process()
    }
}

/// Reads name and command line of `pid`, `None` if it has gone away
pub fn read_process_info(pid: ProcessId) -> Option<ProcessInfo> {
    let name = fs::read_to_string(format!("/proc/{}/comm", pid)).ok()?;
    let cmdline = fs::read(format!("/proc/{}/cmdline", pid))
        .ok()
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            raw.split(|&b| b == 0)
                .filter(|arg| !arg.is_empty())
                .map(|arg| String::from_utf8_lossy(arg).into_owned())
                .collect::<Vec<_>>()
                .join(" ")
        });

    Some(ProcessInfo {
        pid,
        name: name.trim_end().to_string(),
        cmdline,
    })
}

/// Enumerate all running processes, ordered by pid
pub fn enumerate_processes() -> MemoryResult<Vec<ProcessInfo>> {
    let mut processes: Vec<ProcessInfo> = ProcessEnumerator::new()?.collect();
    processes.sort_by_key(|p| p.pid);
    Ok(processes)
}

/// Find processes whose name or command line contains `needle`
pub fn find_processes_by_name(needle: &str) -> MemoryResult<Vec<ProcessInfo>> {
    Ok(enumerate_processes()?
        .into_iter()
        .filter(|p| p.name_matches(needle))
        .collect())
}

/// Looks up running processes.
///
/// Matching is by substring and best effort. When several processes match,
/// `find_by_name` returns the lowest pid; callers that care use
/// `find_all_by_name` and pick one themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessDirectory;

impl ProcessDirectory {
    pub fn new() -> Self {
        ProcessDirectory
    }

    pub fn list(&self) -> MemoryResult<Vec<ProcessInfo>> {
        enumerate_processes()
    }

    pub fn find_all_by_name(&self, needle: &str) -> MemoryResult<Vec<ProcessInfo>> {
        find_processes_by_name(needle)
    }

    pub fn find_by_name(&self, needle: &str) -> MemoryResult<ProcessId> {
        self.find_all_by_name(needle)?
            .first()
            .map(|p| p.pid)
            .ok_or_else(|| MemoryError::ProcessNotFound(needle.to_string()))
    }

    pub fn get(&self, pid: ProcessId) -> MemoryResult<ProcessInfo> {
        read_process_info(pid).ok_or_else(|| MemoryError::ProcessNotFound(pid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_in_enumeration() {
        let current = std::process::id();
        let processes = enumerate_processes().unwrap();
        assert!(processes.iter().any(|p| p.pid == current));
        assert!(processes.windows(2).all(|w| w[0].pid < w[1].pid));
    }

    #[test]
    fn test_find_self_by_name() {
        let directory = ProcessDirectory::new();
        let me = directory.get(std::process::id()).unwrap();
        assert!(!me.name.is_empty());

        let matches = directory.find_all_by_name(&me.name).unwrap();
        assert!(matches.iter().any(|p| p.pid == me.pid));
        assert!(directory.find_by_name(&me.name).unwrap() <= me.pid);
    }

    #[test]
    fn test_find_missing_process() {
        let directory = ProcessDirectory::new();
        let result = directory.find_by_name("no-such-process-name-5f1c2a9e");
        assert!(matches!(result, Err(MemoryError::ProcessNotFound(_))));
        assert!(matches!(
            directory.get(u32::MAX - 1),
            Err(MemoryError::ProcessNotFound(_))
        ));
    }
}
