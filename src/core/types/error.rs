//! Custom error types for memscan

use super::value::TypeKind;
use std::fmt;
use thiserror::Error;

/// Main error type for memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not attached to any process")]
    NotAttached,

    #[error("Failed to read memory at {address}: {reason}")]
    ReadFailed { address: String, reason: String },

    #[error("Failed to write memory at {address}: {reason}")]
    WriteFailed { address: String, reason: String },

    #[error("Cannot decode {kind}: expected {expected} bytes, got {actual}")]
    DecodeError {
        kind: TypeKind,
        expected: usize,
        actual: usize,
    },

    #[error("Value {value} is not representable as {kind}")]
    EncodeError { kind: TypeKind, value: String },

    #[error("Cannot parse {input:?} as {kind}")]
    ParseError { kind: TypeKind, input: String },

    #[error("Invalid value type: {0}")]
    InvalidValueType(String),

    #[error("Scan session holds {session} values, cull requested {requested}")]
    KindMismatch {
        session: TypeKind,
        requested: TypeKind,
    },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Invalid memory region: {0}")]
    InvalidRegion(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

impl MemoryError {
    /// Creates a read failed error
    pub fn read_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MemoryError::ReadFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a write failed error
    pub fn write_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MemoryError::WriteFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a decode error for a byte slice of the wrong length
    pub fn decode(kind: TypeKind, actual: usize) -> Self {
        MemoryError::DecodeError {
            kind,
            expected: kind.size(),
            actual,
        }
    }

    /// Creates an encode error for a value outside the range of `kind`
    pub fn encode(kind: TypeKind, value: impl fmt::Display) -> Self {
        MemoryError::EncodeError {
            kind,
            value: value.to_string(),
        }
    }

    /// Creates a parse error for malformed text
    pub fn parse(kind: TypeKind, input: impl Into<String>) -> Self {
        MemoryError::ParseError {
            kind,
            input: input.into(),
        }
    }

    /// True for per-address failures that a scan recovers from locally
    pub fn is_access_error(&self) -> bool {
        matches!(
            self,
            MemoryError::ReadFailed { .. } | MemoryError::WriteFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MemoryError::InvalidAddress("0xDEADBEEF".to_string());
        assert_eq!(err.to_string(), "Invalid memory address: 0xDEADBEEF");

        let err = MemoryError::decode(TypeKind::I32, 3);
        assert_eq!(err.to_string(), "Cannot decode i32: expected 4 bytes, got 3");

        let err = MemoryError::encode(TypeKind::U8, 300);
        assert_eq!(err.to_string(), "Value 300 is not representable as u8");

        let err = MemoryError::parse(TypeKind::I16, "abc");
        assert_eq!(err.to_string(), "Cannot parse \"abc\" as i16");
    }

    #[test]
    fn test_all_error_variants() {
        let errors: Vec<(MemoryError, &str)> = vec![
            (
                MemoryError::ProcessNotFound("4242".to_string()),
                "Process not found: 4242",
            ),
            (
                MemoryError::PermissionDenied("ptrace scope".to_string()),
                "Permission denied: ptrace scope",
            ),
            (MemoryError::NotAttached, "Not attached to any process"),
            (
                MemoryError::ReadFailed {
                    address: "0x1000".to_string(),
                    reason: "unmapped".to_string(),
                },
                "Failed to read memory at 0x1000: unmapped",
            ),
            (
                MemoryError::WriteFailed {
                    address: "0x2000".to_string(),
                    reason: "read-only mapping".to_string(),
                },
                "Failed to write memory at 0x2000: read-only mapping",
            ),
            (
                MemoryError::InvalidValueType("u128".to_string()),
                "Invalid value type: u128",
            ),
            (
                MemoryError::KindMismatch {
                    session: TypeKind::I32,
                    requested: TypeKind::F32,
                },
                "Scan session holds i32 values, cull requested f32",
            ),
            (MemoryError::Cancelled, "Scan cancelled"),
            (
                MemoryError::InvalidRegion("zzz".to_string()),
                "Invalid memory region: zzz",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_helper_methods() {
        let err = MemoryError::read_failed("0xABCD", "invalid page");
        match err {
            MemoryError::ReadFailed { address, reason } => {
                assert_eq!(address, "0xABCD");
                assert_eq!(reason, "invalid page");
            }
            _ => panic!("Wrong error type"),
        }

        let err = MemoryError::write_failed("0xDEAD", "protected memory");
        match err {
            MemoryError::WriteFailed { address, reason } => {
                assert_eq!(address, "0xDEAD");
                assert_eq!(reason, "protected memory");
            }
            _ => panic!("Wrong error type"),
        }

        match MemoryError::decode(TypeKind::F64, 2) {
            MemoryError::DecodeError {
                kind,
                expected,
                actual,
            } => {
                assert_eq!(kind, TypeKind::F64);
                assert_eq!(expected, 8);
                assert_eq!(actual, 2);
            }
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_access_error_classification() {
        assert!(MemoryError::read_failed("0x1", "x").is_access_error());
        assert!(MemoryError::write_failed("0x1", "x").is_access_error());
        assert!(!MemoryError::NotAttached.is_access_error());
        assert!(!MemoryError::Cancelled.is_access_error());
        assert!(!MemoryError::ProcessNotFound("1".into()).is_access_error());
    }

    #[test]
    fn test_from_implementations() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "test");
        let mem_err: MemoryError = io_err.into();
        assert!(matches!(mem_err, MemoryError::IoError(_)));
    }
}
