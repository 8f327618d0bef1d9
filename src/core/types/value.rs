//! Scalar value kinds and their binary and textual codecs

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of scalar kinds the scanner understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl TypeKind {
    /// Every kind, narrowest integers first
    pub const ALL: [TypeKind; 10] = [
        TypeKind::I8,
        TypeKind::I16,
        TypeKind::I32,
        TypeKind::I64,
        TypeKind::U8,
        TypeKind::U16,
        TypeKind::U32,
        TypeKind::U64,
        TypeKind::F32,
        TypeKind::F64,
    ];

    /// Returns the size in bytes for this kind
    pub const fn size(&self) -> usize {
        match self {
            TypeKind::I8 | TypeKind::U8 => 1,
            TypeKind::I16 | TypeKind::U16 => 2,
            TypeKind::I32 | TypeKind::U32 | TypeKind::F32 => 4,
            TypeKind::I64 | TypeKind::U64 | TypeKind::F64 => 8,
        }
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, TypeKind::F32 | TypeKind::F64)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            TypeKind::I8 => "i8",
            TypeKind::I16 => "i16",
            TypeKind::I32 => "i32",
            TypeKind::I64 => "i64",
            TypeKind::U8 => "u8",
            TypeKind::U16 => "u16",
            TypeKind::U32 => "u32",
            TypeKind::U64 => "u64",
            TypeKind::F32 => "f32",
            TypeKind::F64 => "f64",
        }
    }

    /// Decodes exactly `self.size()` native-endian bytes
    pub fn decode(&self, bytes: &[u8]) -> MemoryResult<ScanValue> {
        let bad_len = |_| MemoryError::decode(*self, bytes.len());

        let value = match self {
            TypeKind::I8 => ScanValue::I8(i8::from_ne_bytes(bytes.try_into().map_err(bad_len)?)),
            TypeKind::I16 => {
                ScanValue::I16(i16::from_ne_bytes(bytes.try_into().map_err(bad_len)?))
            }
            TypeKind::I32 => {
                ScanValue::I32(i32::from_ne_bytes(bytes.try_into().map_err(bad_len)?))
            }
            TypeKind::I64 => {
                ScanValue::I64(i64::from_ne_bytes(bytes.try_into().map_err(bad_len)?))
            }
            TypeKind::U8 => ScanValue::U8(u8::from_ne_bytes(bytes.try_into().map_err(bad_len)?)),
            TypeKind::U16 => {
                ScanValue::U16(u16::from_ne_bytes(bytes.try_into().map_err(bad_len)?))
            }
            TypeKind::U32 => {
                ScanValue::U32(u32::from_ne_bytes(bytes.try_into().map_err(bad_len)?))
            }
            TypeKind::U64 => {
                ScanValue::U64(u64::from_ne_bytes(bytes.try_into().map_err(bad_len)?))
            }
            TypeKind::F32 => {
                ScanValue::F32(f32::from_ne_bytes(bytes.try_into().map_err(bad_len)?))
            }
            TypeKind::F64 => {
                ScanValue::F64(f64::from_ne_bytes(bytes.try_into().map_err(bad_len)?))
            }
        };

        Ok(value)
    }

    /// Coerces `value` to this kind and returns its native-endian bytes
    pub fn encode(&self, value: &ScanValue) -> MemoryResult<Vec<u8>> {
        Ok(self.coerce(value)?.to_bytes())
    }

    /// Converts `value` to this kind, failing if it is not representable.
    ///
    /// Integers widen or narrow when in range, integral finite floats convert
    /// to integers, and any number converts to a float kind whose range holds it.
    pub fn coerce(&self, value: &ScanValue) -> MemoryResult<ScanValue> {
        if value.kind() == *self {
            return Ok(*value);
        }

        let out_of_range = || MemoryError::encode(*self, value);

        if self.is_float() {
            let wide = match value.as_number() {
                Number::Int(i) => i as f64,
                Number::Float(f) => f,
            };
            return match self {
                TypeKind::F32 => {
                    if wide.is_finite() && wide.abs() > f32::MAX as f64 {
                        Err(out_of_range())
                    } else {
                        Ok(ScanValue::F32(wide as f32))
                    }
                }
                _ => Ok(ScanValue::F64(wide)),
            };
        }

        let int = match value.as_number() {
            Number::Int(i) => i,
            Number::Float(f) if f.is_finite() && f.fract() == 0.0 => f as i128,
            Number::Float(_) => return Err(out_of_range()),
        };

        self.from_i128(int).ok_or_else(out_of_range)
    }

    /// Parses text into a value of this kind.
    ///
    /// Integer kinds accept an optional sign and a `0x` prefix for hex. Float
    /// text that overflows the kind is rejected; infinity and NaN must be
    /// spelled out.
    pub fn parse(&self, text: &str) -> MemoryResult<ScanValue> {
        let trimmed = text.trim();
        let malformed = || MemoryError::parse(*self, text);

        match self {
            TypeKind::F32 => match trimmed.parse::<f32>() {
                Ok(f) if f.is_finite() || is_non_finite_literal(trimmed) => Ok(ScanValue::F32(f)),
                _ => Err(malformed()),
            },
            TypeKind::F64 => match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() || is_non_finite_literal(trimmed) => Ok(ScanValue::F64(f)),
                _ => Err(malformed()),
            },
            _ => parse_integer(trimmed)
                .and_then(|i| self.from_i128(i))
                .ok_or_else(malformed),
        }
    }

    fn from_i128(&self, value: i128) -> Option<ScanValue> {
        let converted = match self {
            TypeKind::I8 => ScanValue::I8(i8::try_from(value).ok()?),
            TypeKind::I16 => ScanValue::I16(i16::try_from(value).ok()?),
            TypeKind::I32 => ScanValue::I32(i32::try_from(value).ok()?),
            TypeKind::I64 => ScanValue::I64(i64::try_from(value).ok()?),
            TypeKind::U8 => ScanValue::U8(u8::try_from(value).ok()?),
            TypeKind::U16 => ScanValue::U16(u16::try_from(value).ok()?),
            TypeKind::U32 => ScanValue::U32(u32::try_from(value).ok()?),
            TypeKind::U64 => ScanValue::U64(u64::try_from(value).ok()?),
            TypeKind::F32 => ScanValue::F32(value as f32),
            TypeKind::F64 => ScanValue::F64(value as f64),
        };
        Some(converted)
    }
}

/// `inf`, `infinity` or `nan` in any case, with an optional sign
fn is_non_finite_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    ["inf", "infinity", "nan"]
        .iter()
        .any(|literal| unsigned.eq_ignore_ascii_case(literal))
}

fn parse_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }

    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) if !hex.starts_with(['+', '-']) => i128::from_str_radix(hex, 16).ok()?,
        Some(_) => return None,
        None => digits.parse::<i128>().ok()?,
    };

    Some(if negative { -magnitude } else { magnitude })
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeKind {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "i8" | "int8" | "byte" => TypeKind::I8,
            "i16" | "int16" | "short" => TypeKind::I16,
            "i32" | "int32" | "int" => TypeKind::I32,
            "i64" | "int64" | "long" => TypeKind::I64,
            "u8" | "uint8" => TypeKind::U8,
            "u16" | "uint16" => TypeKind::U16,
            "u32" | "uint32" => TypeKind::U32,
            "u64" | "uint64" => TypeKind::U64,
            "f32" | "float" => TypeKind::F32,
            "f64" | "double" => TypeKind::F64,
            _ => return Err(MemoryError::InvalidValueType(s.to_string())),
        };
        Ok(kind)
    }
}

/// A decoded scalar read from, or destined for, process memory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ScanValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

enum Number {
    Int(i128),
    Float(f64),
}

impl ScanValue {
    /// Gets the kind of this value
    pub fn kind(&self) -> TypeKind {
        match self {
            ScanValue::I8(_) => TypeKind::I8,
            ScanValue::I16(_) => TypeKind::I16,
            ScanValue::I32(_) => TypeKind::I32,
            ScanValue::I64(_) => TypeKind::I64,
            ScanValue::U8(_) => TypeKind::U8,
            ScanValue::U16(_) => TypeKind::U16,
            ScanValue::U32(_) => TypeKind::U32,
            ScanValue::U64(_) => TypeKind::U64,
            ScanValue::F32(_) => TypeKind::F32,
            ScanValue::F64(_) => TypeKind::F64,
        }
    }

    /// Returns the size in bytes of the value
    pub fn size(&self) -> usize {
        self.kind().size()
    }

    /// Converts the value to native-endian bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ScanValue::I8(v) => v.to_ne_bytes().to_vec(),
            ScanValue::I16(v) => v.to_ne_bytes().to_vec(),
            ScanValue::I32(v) => v.to_ne_bytes().to_vec(),
            ScanValue::I64(v) => v.to_ne_bytes().to_vec(),
            ScanValue::U8(v) => v.to_ne_bytes().to_vec(),
            ScanValue::U16(v) => v.to_ne_bytes().to_vec(),
            ScanValue::U32(v) => v.to_ne_bytes().to_vec(),
            ScanValue::U64(v) => v.to_ne_bytes().to_vec(),
            ScanValue::F32(v) => v.to_ne_bytes().to_vec(),
            ScanValue::F64(v) => v.to_ne_bytes().to_vec(),
        }
    }

    /// Exact match used by scans: same kind and identical bit pattern.
    ///
    /// Unlike `==`, a NaN matches a NaN with the same bits and `0.0` does not
    /// match `-0.0`.
    pub fn matches(&self, other: &ScanValue) -> bool {
        self.kind() == other.kind() && self.to_bytes() == other.to_bytes()
    }

    fn as_number(&self) -> Number {
        match *self {
            ScanValue::I8(v) => Number::Int(v as i128),
            ScanValue::I16(v) => Number::Int(v as i128),
            ScanValue::I32(v) => Number::Int(v as i128),
            ScanValue::I64(v) => Number::Int(v as i128),
            ScanValue::U8(v) => Number::Int(v as i128),
            ScanValue::U16(v) => Number::Int(v as i128),
            ScanValue::U32(v) => Number::Int(v as i128),
            ScanValue::U64(v) => Number::Int(v as i128),
            ScanValue::F32(v) => Number::Float(v as f64),
            ScanValue::F64(v) => Number::Float(v),
        }
    }
}

impl fmt::Display for ScanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanValue::I8(v) => write!(f, "{}", v),
            ScanValue::I16(v) => write!(f, "{}", v),
            ScanValue::I32(v) => write!(f, "{}", v),
            ScanValue::I64(v) => write!(f, "{}", v),
            ScanValue::U8(v) => write!(f, "{}", v),
            ScanValue::U16(v) => write!(f, "{}", v),
            ScanValue::U32(v) => write!(f, "{}", v),
            ScanValue::U64(v) => write!(f, "{}", v),
            ScanValue::F32(v) => write!(f, "{}", v),
            ScanValue::F64(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ScanValue {
                fn from(value: $ty) -> Self {
                    ScanValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_size() {
        assert_eq!(TypeKind::I8.size(), 1);
        assert_eq!(TypeKind::U16.size(), 2);
        assert_eq!(TypeKind::F32.size(), 4);
        assert_eq!(TypeKind::I64.size(), 8);
        for kind in TypeKind::ALL {
            assert_eq!(kind.decode(&vec![0u8; kind.size()]).unwrap().size(), kind.size());
        }
    }

    #[test]
    fn test_value_to_bytes() {
        assert_eq!(
            ScanValue::U32(0x12345678).to_bytes(),
            0x12345678u32.to_ne_bytes().to_vec()
        );
        assert_eq!(ScanValue::I8(-1).to_bytes(), vec![0xFF]);
    }

    #[test]
    fn test_decode_wrong_length() {
        let err = TypeKind::I32.decode(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            MemoryError::DecodeError {
                kind: TypeKind::I32,
                expected: 4,
                actual: 3
            }
        ));
        assert!(TypeKind::U8.decode(&[]).is_err());
        assert!(TypeKind::F64.decode(&[0; 9]).is_err());
    }

    #[test]
    fn test_encode_range_checks() {
        assert_eq!(
            TypeKind::U8.encode(&ScanValue::I64(255)).unwrap(),
            vec![255]
        );
        assert!(TypeKind::U8.encode(&ScanValue::I64(300)).is_err());
        assert!(TypeKind::U32.encode(&ScanValue::I32(-1)).is_err());
        assert!(TypeKind::I8.encode(&ScanValue::F64(1.5)).is_err());
        assert!(TypeKind::I64.encode(&ScanValue::F64(f64::NAN)).is_err());
        assert!(TypeKind::F32.encode(&ScanValue::F64(1e300)).is_err());
        assert_eq!(
            TypeKind::I16.coerce(&ScanValue::F64(-12.0)).unwrap(),
            ScanValue::I16(-12)
        );
        assert_eq!(
            TypeKind::F64.coerce(&ScanValue::U64(7)).unwrap(),
            ScanValue::F64(7.0)
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(TypeKind::I32.parse("42").unwrap(), ScanValue::I32(42));
        assert_eq!(TypeKind::I32.parse(" -42 ").unwrap(), ScanValue::I32(-42));
        assert_eq!(TypeKind::U16.parse("0xFF").unwrap(), ScanValue::U16(255));
        assert_eq!(TypeKind::I8.parse("-0x80").unwrap(), ScanValue::I8(-128));
        assert_eq!(TypeKind::F64.parse("2.5").unwrap(), ScanValue::F64(2.5));

        assert!(TypeKind::I32.parse("forty-two").is_err());
        assert!(TypeKind::U8.parse("256").is_err());
        assert!(TypeKind::U8.parse("-1").is_err());
        assert!(TypeKind::I32.parse("").is_err());
        assert!(TypeKind::I32.parse("--5").is_err());
        assert!(TypeKind::I32.parse("0x-5").is_err());
        assert!(TypeKind::I32.parse("1.0").is_err());
        assert!(matches!(
            TypeKind::F32.parse("abc"),
            Err(MemoryError::ParseError { kind: TypeKind::F32, .. })
        ));

        assert!(matches!(
            TypeKind::F32.parse("1e39"),
            Err(MemoryError::ParseError { kind: TypeKind::F32, .. })
        ));
        assert!(TypeKind::F32.parse("-1e39").is_err());
        assert!(TypeKind::F64.parse("1e309").is_err());
        assert_eq!(TypeKind::F64.parse("1e39").unwrap(), ScanValue::F64(1e39));
        assert_eq!(
            TypeKind::F32.parse("-Infinity").unwrap(),
            ScanValue::F32(f32::NEG_INFINITY)
        );
        assert_eq!(TypeKind::F64.parse("inf").unwrap(), ScanValue::F64(f64::INFINITY));
        assert!(matches!(TypeKind::F32.parse("NaN"), Ok(ScanValue::F32(f)) if f.is_nan()));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("i32".parse::<TypeKind>().unwrap(), TypeKind::I32);
        assert_eq!("UINT64".parse::<TypeKind>().unwrap(), TypeKind::U64);
        assert_eq!("double".parse::<TypeKind>().unwrap(), TypeKind::F64);
        assert!("u128".parse::<TypeKind>().is_err());
        for kind in TypeKind::ALL {
            assert_eq!(kind.to_string().parse::<TypeKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_matches_is_bitwise() {
        assert!(ScanValue::I32(5).matches(&ScanValue::I32(5)));
        assert!(!ScanValue::I32(5).matches(&ScanValue::U32(5)));
        assert!(ScanValue::F32(f32::NAN).matches(&ScanValue::F32(f32::NAN)));
        assert!(!ScanValue::F64(0.0).matches(&ScanValue::F64(-0.0)));
    }

    #[test]
    fn test_display() {
        assert_eq!(ScanValue::I64(-7).to_string(), "-7");
        assert_eq!(ScanValue::F32(1.5).to_string(), "1.5");
        assert_eq!(TypeKind::U16.to_string(), "u16");
    }
}
