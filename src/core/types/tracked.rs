//! Candidate addresses tracked across scans

use super::{Address, MemoryResult, ScanValue, TypeKind};
use crate::memory::ProcessMemory;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An address believed to hold the value of interest, with its last two
/// observed values.
///
/// Two tracked values are equal when they share address and kind, whatever
/// they currently hold, so a candidate list behaves as a set keyed on location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackedValue {
    pub address: Address,
    pub kind: TypeKind,
    pub value: ScanValue,
    pub previous_value: ScanValue,
}

impl TrackedValue {
    /// First observation: `previous_value` equals `value`
    pub fn new(address: Address, kind: TypeKind, value: ScanValue) -> Self {
        TrackedValue {
            address,
            kind,
            value,
            previous_value: value,
        }
    }

    /// Re-reads the value from `source`.
    ///
    /// On failure the cached pair is left exactly as it was.
    pub fn refresh<M: ProcessMemory + ?Sized>(&mut self, source: &M) -> MemoryResult<ScanValue> {
        let current = source.read(self.address, self.kind)?;
        self.previous_value = self.value;
        self.value = current;
        Ok(current)
    }

    /// Writes `value` to the tracked address, updating the cache on success
    pub fn write<M: ProcessMemory + ?Sized>(
        &mut self,
        source: &M,
        value: &ScanValue,
    ) -> MemoryResult<()> {
        let coerced = self.kind.coerce(value)?;
        source.write(self.address, self.kind, &coerced)?;
        self.previous_value = self.value;
        self.value = coerced;
        Ok(())
    }

    /// True when the last refresh observed a different value
    pub fn changed(&self) -> bool {
        !self.value.matches(&self.previous_value)
    }
}

impl PartialEq for TrackedValue {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.kind == other.kind
    }
}

impl Eq for TrackedValue {}

impl Hash for TrackedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
        self.kind.hash(state);
    }
}

impl PartialEq<ScanValue> for TrackedValue {
    fn eq(&self, other: &ScanValue) -> bool {
        self.value.matches(other)
    }
}

impl fmt::Display for TrackedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} = {}", self.address, self.kind, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryRegion, Permissions, SimulatedProcess};
    use std::collections::HashSet;

    fn process_with(value: i32) -> SimulatedProcess {
        let mut process = SimulatedProcess::new();
        let mut image = vec![0u8; 16];
        image[4..8].copy_from_slice(&value.to_ne_bytes());
        process.map(MemoryRegion::new(0x1000, 16, Permissions::READ_WRITE), image);
        process
    }

    #[test]
    fn test_new_sets_previous() {
        let tracked = TrackedValue::new(Address::new(0x10), TypeKind::I32, ScanValue::I32(7));
        assert_eq!(tracked.previous_value, ScanValue::I32(7));
        assert!(!tracked.changed());
    }

    #[test]
    fn test_refresh_shifts_values() {
        let process = process_with(42);
        let mut tracked = TrackedValue::new(Address::new(0x1004), TypeKind::I32, ScanValue::I32(42));

        process.poke(Address::new(0x1004), &43i32.to_ne_bytes()).unwrap();
        assert_eq!(tracked.refresh(&process).unwrap(), ScanValue::I32(43));
        assert_eq!(tracked.value, ScanValue::I32(43));
        assert_eq!(tracked.previous_value, ScanValue::I32(42));
        assert!(tracked.changed());

        tracked.refresh(&process).unwrap();
        assert_eq!(tracked.previous_value, ScanValue::I32(43));
        assert!(!tracked.changed());
    }

    #[test]
    fn test_failed_refresh_keeps_state() {
        let process = process_with(42);
        let mut tracked = TrackedValue {
            address: Address::new(0x9000),
            kind: TypeKind::I32,
            value: ScanValue::I32(2),
            previous_value: ScanValue::I32(1),
        };

        let err = tracked.refresh(&process).unwrap_err();
        assert!(err.is_access_error());
        assert_eq!(tracked.value, ScanValue::I32(2));
        assert_eq!(tracked.previous_value, ScanValue::I32(1));
    }

    #[test]
    fn test_write_through() {
        let process = process_with(1);
        let mut tracked = TrackedValue::new(Address::new(0x1004), TypeKind::I32, ScanValue::I32(1));

        tracked.write(&process, &ScanValue::I64(99)).unwrap();
        assert_eq!(tracked.value, ScanValue::I32(99));
        assert_eq!(process.read(Address::new(0x1004), TypeKind::I32).unwrap(), ScanValue::I32(99));

        assert!(tracked.write(&process, &ScanValue::I64(i64::MAX)).is_err());
        assert_eq!(tracked.value, ScanValue::I32(99));
    }

    #[test]
    fn test_identity_equality() {
        let a = TrackedValue::new(Address::new(0x10), TypeKind::I32, ScanValue::I32(1));
        let b = TrackedValue::new(Address::new(0x10), TypeKind::I32, ScanValue::I32(2));
        let c = TrackedValue::new(Address::new(0x10), TypeKind::U32, ScanValue::U32(1));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a == ScanValue::I32(1));
        assert!(a != ScanValue::I32(2));

        let set: HashSet<TrackedValue> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
