//! Absolute address in the target process's address space

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents a memory address with type-safe operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u64);

impl Address {
    pub const fn new(value: u64) -> Self {
        Address(value)
    }

    pub const fn null() -> Self {
        Address(0)
    }

    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the address is aligned to the specified boundary
    pub const fn is_aligned(&self, alignment: u64) -> bool {
        alignment != 0 && self.0 % alignment == 0
    }

    /// Address `bytes` past this one, `None` on overflow
    pub fn checked_add(&self, bytes: u64) -> Option<Self> {
        self.0.checked_add(bytes).map(Address)
    }

    /// Distance in bytes from `base` up to this address
    pub fn offset_from(&self, base: Address) -> Option<u64> {
        self.0.checked_sub(base.0)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parses `0x`-prefixed hex or plain decimal
    pub fn parse(text: &str) -> MemoryResult<Self> {
        text.parse()
    }
}

impl FromStr for Address {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        };

        value
            .map(Address::new)
            .map_err(|_| MemoryError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address::new(value)
    }
}

impl From<usize> for Address {
    fn from(value: usize) -> Self {
        Address::new(value as u64)
    }
}

impl<T> From<*const T> for Address {
    fn from(ptr: *const T) -> Self {
        Address::new(ptr as usize as u64)
    }
}
