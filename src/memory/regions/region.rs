//! A single mapping of the target's address space

use crate::core::types::{Address, MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kernel mappings that cannot be read through another process's `mem` file
pub const PSEUDO_REGIONS: &[&str] = &["[vvar]", "[vvar_vclock]", "[vsyscall]"];

/// Access flags of a mapping, as in the `rwxp` column of `/proc/<pid>/maps`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
    pub shared: bool,
}

impl Permissions {
    pub const NONE: Self = Self::private(false, false, false);
    pub const READ_ONLY: Self = Self::private(true, false, false);
    pub const READ_WRITE: Self = Self::private(true, true, false);
    pub const READ_EXECUTE: Self = Self::private(true, false, true);
    pub const READ_WRITE_EXECUTE: Self = Self::private(true, true, true);

    const fn private(read: bool, write: bool, execute: bool) -> Self {
        Permissions {
            read,
            write,
            execute,
            shared: false,
        }
    }
}

impl FromStr for Permissions {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MemoryError::InvalidRegion(format!("bad permissions {:?}", s));

        let flags = s.as_bytes();
        if flags.len() != 4 {
            return Err(invalid());
        }

        let flag = |index: usize, set: u8| match flags[index] {
            b'-' => Ok(false),
            c if c == set => Ok(true),
            _ => Err(invalid()),
        };

        let shared = match flags[3] {
            b's' => true,
            b'p' => false,
            _ => return Err(invalid()),
        };

        Ok(Permissions {
            read: flag(0, b'r')?,
            write: flag(1, b'w')?,
            execute: flag(2, b'x')?,
            shared,
        })
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' },
            if self.shared { 's' } else { 'p' },
        )
    }
}

/// Information about a memory region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    /// First address of the region
    pub start: Address,
    /// One past the last address of the region
    pub end: Address,
    pub permissions: Permissions,
    /// Offset into the backing file
    pub offset: u64,
    pub device: String,
    pub inode: u64,
    /// Backing path or a pseudo-name such as `[heap]`; `None` for anonymous memory
    pub label: Option<String>,
}

impl MemoryRegion {
    /// Creates an anonymous region of `len` bytes
    pub fn new(start: u64, len: u64, permissions: Permissions) -> Self {
        MemoryRegion {
            start: Address::new(start),
            end: Address::new(start.saturating_add(len)),
            permissions,
            offset: 0,
            device: "00:00".to_string(),
            inode: 0,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parses one line of `/proc/<pid>/maps`:
    /// `start-end perms offset dev inode [label]`
    pub fn parse_maps_line(line: &str) -> MemoryResult<Self> {
        let invalid = || MemoryError::InvalidRegion(line.to_string());
        let mut rest = line;

        let range = next_field(&mut rest).ok_or_else(invalid)?;
        let perms = next_field(&mut rest).ok_or_else(invalid)?;
        let offset = next_field(&mut rest).ok_or_else(invalid)?;
        let device = next_field(&mut rest).ok_or_else(invalid)?;
        let inode = next_field(&mut rest).ok_or_else(invalid)?;
        let label = rest.trim();

        let (start, end) = range.split_once('-').ok_or_else(invalid)?;
        let start = u64::from_str_radix(start, 16).map_err(|_| invalid())?;
        let end = u64::from_str_radix(end, 16).map_err(|_| invalid())?;
        if end < start {
            return Err(invalid());
        }

        Ok(MemoryRegion {
            start: Address::new(start),
            end: Address::new(end),
            permissions: perms.parse()?,
            offset: u64::from_str_radix(offset, 16).map_err(|_| invalid())?,
            device: device.to_string(),
            inode: inode.parse().map_err(|_| invalid())?,
            label: (!label.is_empty()).then(|| label.to_string()),
        })
    }

    pub fn size(&self) -> u64 {
        self.end.as_u64() - self.start.as_u64()
    }

    pub fn is_readable(&self) -> bool {
        self.permissions.read
    }

    pub fn is_writable(&self) -> bool {
        self.permissions.write
    }

    pub fn is_executable(&self) -> bool {
        self.permissions.execute
    }

    /// True for kernel pseudo-regions that are unreadable from outside the process
    pub fn is_pseudo(&self) -> bool {
        self.label
            .as_deref()
            .map_or(false, |label| PSEUDO_REGIONS.contains(&label))
    }

    /// Check if an address is within this region
    pub fn contains(&self, address: Address) -> bool {
        address >= self.start && address < self.end
    }
}

fn next_field<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed
        .find(char::is_whitespace)
        .unwrap_or(trimmed.len());
    let (field, tail) = trimmed.split_at(end);
    *rest = tail;
    Some(field)
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:x}-{:x} {} {}",
            self.start,
            self.end,
            self.permissions,
            self.label.as_deref().unwrap_or("[anon]")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_backed_line() {
        let line = "55d0c8a00000-55d0c8a21000 r-xp 00002000 fd:01 1835053                    /usr/bin/cat";
        let region = MemoryRegion::parse_maps_line(line).unwrap();

        assert_eq!(region.start, Address::new(0x55d0c8a00000));
        assert_eq!(region.end, Address::new(0x55d0c8a21000));
        assert_eq!(region.size(), 0x21000);
        assert_eq!(region.permissions, Permissions::READ_EXECUTE);
        assert_eq!(region.offset, 0x2000);
        assert_eq!(region.device, "fd:01");
        assert_eq!(region.inode, 1835053);
        assert_eq!(region.label.as_deref(), Some("/usr/bin/cat"));
        assert!(!region.is_pseudo());
    }

    #[test]
    fn test_parse_anonymous_and_spaces_in_path() {
        let anon = MemoryRegion::parse_maps_line("7f0000000000-7f0000001000 rw-p 00000000 00:00 0")
            .unwrap();
        assert_eq!(anon.label, None);
        assert!(anon.is_writable());

        let spaced = MemoryRegion::parse_maps_line(
            "7f0000001000-7f0000002000 rw-s 00000000 00:05 77 /dev/shm/my file (deleted)",
        )
        .unwrap();
        assert_eq!(spaced.label.as_deref(), Some("/dev/shm/my file (deleted)"));
        assert!(spaced.permissions.shared);
    }

    #[test]
    fn test_pseudo_regions() {
        let vvar = MemoryRegion::parse_maps_line("7ffd1000-7ffd5000 r--p 00000000 00:00 0 [vvar]")
            .unwrap();
        assert!(vvar.is_pseudo());

        let vsyscall = MemoryRegion::parse_maps_line(
            "ffffffffff600000-ffffffffff601000 --xp 00000000 00:00 0                  [vsyscall]",
        )
        .unwrap();
        assert!(vsyscall.is_pseudo());
        assert!(!vsyscall.is_readable());

        let heap = MemoryRegion::new(0x1000, 0x1000, Permissions::READ_WRITE).with_label("[heap]");
        assert!(!heap.is_pseudo());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(MemoryRegion::parse_maps_line("").is_err());
        assert!(MemoryRegion::parse_maps_line("zz-10 rw-p 0 00:00 0").is_err());
        assert!(MemoryRegion::parse_maps_line("2000-1000 rw-p 0 00:00 0").is_err());
        assert!(MemoryRegion::parse_maps_line("1000-2000 rwzp 0 00:00 0").is_err());
        assert!(MemoryRegion::parse_maps_line("1000-2000 rw-p 0 00:00").is_err());
    }

    #[test]
    fn test_permissions_display_round_trip() {
        for text in ["rw-p", "r-xp", "---p", "rwxs", "r--s"] {
            assert_eq!(text.parse::<Permissions>().unwrap().to_string(), text);
        }
        assert!("rw-".parse::<Permissions>().is_err());
    }

    #[test]
    fn test_contains() {
        let region = MemoryRegion::new(0x1000, 0x100, Permissions::READ_ONLY);
        assert!(region.contains(Address::new(0x1000)));
        assert!(region.contains(Address::new(0x10FF)));
        assert!(!region.contains(Address::new(0x1100)));
        assert_eq!(region.to_string(), "1000-1100 r--p [anon]");
    }
}
