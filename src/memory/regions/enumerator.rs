//! Lazy enumeration of `/proc/<pid>/maps`

use crate::core::types::{MemoryError, MemoryResult, ProcessId};
use crate::memory::regions::MemoryRegion;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use tracing::warn;

/// Enumerates memory regions from a maps listing, one line at a time.
///
/// The listing is read as iteration proceeds, so an enumerator reflects the
/// map at the time it is consumed and cannot be restarted; create a new one
/// to observe later changes.
pub struct RegionEnumerator<R> {
    lines: Lines<R>,
}

impl RegionEnumerator<BufReader<File>> {
    /// Opens the maps listing of `pid`
    pub fn open(pid: ProcessId) -> MemoryResult<Self> {
        let path = format!("/proc/{}/maps", pid);
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => MemoryError::ProcessNotFound(pid.to_string()),
            io::ErrorKind::PermissionDenied => {
                MemoryError::PermissionDenied(format!("cannot read {}", path))
            }
            _ => MemoryError::IoError(e),
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> RegionEnumerator<R> {
    /// Enumerates regions from any reader in maps format
    pub fn from_reader(reader: R) -> Self {
        RegionEnumerator {
            lines: reader.lines(),
        }
    }

    /// Get the next well-formed region, skipping lines that fail to parse
    pub fn next_region(&mut self) -> Option<MemoryRegion> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    // The process exited or the listing vanished mid-read
                    warn!("Stopping region enumeration: {}", e);
                    return None;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match MemoryRegion::parse_maps_line(&line) {
                Ok(region) => return Some(region),
                Err(e) => warn!("Skipping maps entry: {}", e),
            }
        }
    }
}

impl<R: BufRead> Iterator for RegionEnumerator<R> {
    type Item = MemoryRegion;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_region()
    }
}

/// Enumerate all memory regions of a process
pub fn enumerate_regions(pid: ProcessId) -> MemoryResult<Vec<MemoryRegion>> {
    Ok(RegionEnumerator::open(pid)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Address;
    use std::io::Cursor;

    const MAPS: &str = "\
55d0c8a00000-55d0c8a21000 r-xp 00002000 fd:01 1835053    /usr/bin/cat
55d0c8c21000-55d0c8c42000 rw-p 00000000 00:00 0          [heap]
this line is garbage

7ffd1000-7ffd5000 r--p 00000000 00:00 0                  [vvar]
7ffe0000-7ffe2000 rw-p 00000000 00:00 0                  [stack]
";

    #[test]
    fn test_enumerate_from_reader_skips_garbage() {
        let regions: Vec<_> = RegionEnumerator::from_reader(Cursor::new(MAPS)).collect();
        assert_eq!(regions.len(), 4);
        assert_eq!(regions[0].label.as_deref(), Some("/usr/bin/cat"));
        assert_eq!(regions[1].label.as_deref(), Some("[heap]"));
        assert!(regions[2].is_pseudo());
        assert_eq!(regions[3].start, Address::new(0x7ffe0000));
    }

    #[test]
    fn test_enumerator_is_exhausted_once() {
        let mut regions = RegionEnumerator::from_reader(Cursor::new(MAPS));
        assert_eq!(regions.by_ref().count(), 4);
        assert!(regions.next().is_none());
    }

    #[test]
    fn test_enumerate_current_process() {
        let regions = enumerate_regions(std::process::id()).unwrap();
        assert!(!regions.is_empty());
        assert!(regions.iter().any(|r| r.is_readable()));
        assert!(regions.windows(2).all(|w| w[0].start <= w[1].start));
    }

    #[test]
    fn test_enumerate_missing_process() {
        let result = RegionEnumerator::open(u32::MAX - 1);
        assert!(matches!(result, Err(MemoryError::ProcessNotFound(_))));
    }
}
