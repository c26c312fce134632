use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use simdutf8::basic::from_utf8;

use crate::error::{Error, Result};
use crate::geometry::Geometry;

/// A decoded column value, or an application value to bind as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean (parameters only; BOOL columns decode as `Int8`)
    Bool(bool),
    /// TINYINT
    Int8(i8),
    /// SMALLINT
    Int16(i16),
    /// INT, MEDIUMINT
    Int32(i32),
    /// BIGINT
    Int64(i64),
    /// TINYINT UNSIGNED
    UInt8(u8),
    /// SMALLINT UNSIGNED, YEAR
    UInt16(u16),
    /// INT UNSIGNED, MEDIUMINT UNSIGNED
    UInt32(u32),
    /// BIGINT UNSIGNED
    UInt64(u64),
    /// FLOAT - 4-byte floating point
    Float32(f32),
    /// DOUBLE - 8-byte floating point
    Float64(f64),
    /// DECIMAL, kept as its exact text
    Decimal(Decimal),
    /// DATE
    Date(NaiveDate),
    /// TIME, within a single day
    Time(NaiveTime),
    /// DATETIME
    NaiveDateTime(NaiveDateTime),
    /// TIMESTAMP. Decoded values always carry a zero offset.
    DateTime(DateTime<FixedOffset>),
    /// `0000-00-00`
    ZeroDate,
    /// `0000-00-00 00:00:00`
    ZeroDateTime,
    /// BLOB, STRING, VARCHAR, VAR_STRING, ENUM, SET
    Binary(Vec<u8>),
    /// UTF-8 text (parameters only; string columns decode as `Binary`)
    Text(String),
    /// JSON document
    Json(serde_json::Value),
    /// BIT(M)
    Bit(BitString),
    /// GEOMETRY
    Geometry(Geometry),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ============================================================================
// Decimal
// ============================================================================

/// Exact decimal number backed by its base-10 text.
///
/// The text is validated on construction but never converted to binary
/// floating point, so no digit is ever lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

impl Decimal {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Parse a decimal from raw protocol bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let s = from_utf8(bytes).map_err(|_| {
            Error::MalformedDecimalLiteral(String::from_utf8_lossy(bytes).into_owned())
        })?;
        s.parse()
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if is_decimal_literal(s.as_bytes()) {
            Ok(Decimal(s.to_owned()))
        } else {
            Err(Error::MalformedDecimalLiteral(s.to_owned()))
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `[+-]digits[.digits][e[+-]digits]`, with at least one mantissa digit
fn is_decimal_literal(s: &[u8]) -> bool {
    let s = s.strip_prefix(b"-").or_else(|| s.strip_prefix(b"+")).unwrap_or(s);
    let (mantissa, exponent) = match s.iter().position(|b| *b == b'e' || *b == b'E') {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };

    let mut digits = 0;
    let mut dots = 0;
    for b in mantissa {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' => dots += 1,
            _ => return false,
        }
    }
    if digits == 0 || dots > 1 {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp
                .strip_prefix(b"-")
                .or_else(|| exp.strip_prefix(b"+"))
                .unwrap_or(exp);
            !exp.is_empty() && exp.iter().all(u8::is_ascii_digit)
        }
    }
}

#[cfg(feature = "with-rust-decimal")]
impl TryFrom<&Decimal> for rust_decimal::Decimal {
    type Error = Error;

    fn try_from(value: &Decimal) -> Result<Self> {
        let s = value.as_str();
        let parsed = if s.contains(['e', 'E']) {
            rust_decimal::Decimal::from_scientific(s)
        } else {
            rust_decimal::Decimal::from_str_exact(s)
        };
        parsed.map_err(|e| Error::MalformedDecimalLiteral(format!("{}: {}", s, e)))
    }
}

#[cfg(feature = "with-rust-decimal")]
impl From<rust_decimal::Decimal> for Decimal {
    fn from(value: rust_decimal::Decimal) -> Self {
        Decimal(value.to_string())
    }
}

// ============================================================================
// BitString
// ============================================================================

/// A bit string of exact length.
///
/// Bits are stored MSB-first and left-aligned; unused trailing bits of the
/// last byte are always zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitString {
    bytes: Vec<u8>,
    len: usize,
}

impl BitString {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            len: 0,
        }
    }

    /// The low `len` bits of `value`, most significant first
    pub fn from_u64(value: u64, len: usize) -> Result<Self> {
        if len > 64 {
            return Err(Error::InvalidParameterValue(format!(
                "bit length {} does not fit in u64",
                len
            )));
        }
        Ok((0..len).rev().map(|i| (value >> i) & 1 == 1).collect())
    }

    /// The first `len` bits of `bytes`, MSB-first
    pub fn from_bytes(bytes: &[u8], len: usize) -> Result<Self> {
        if len > bytes.len() * 8 {
            return Err(Error::InvalidParameterValue(format!(
                "bit length {} exceeds {} bytes",
                len,
                bytes.len()
            )));
        }
        Ok((0..len).map(|i| bit_at(bytes, i)).collect())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, idx: usize) -> Option<bool> {
        (idx < self.len).then(|| bit_at(&self.bytes, idx))
    }

    pub fn push(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> (self.len % 8);
            }
        }
        self.len += 1;
    }

    /// Left-aligned backing bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_u64(&self) -> Option<u64> {
        if self.len > 64 {
            return None;
        }
        Some(
            (0..self.len)
                .fold(0u64, |acc, i| (acc << 1) | u64::from(bit_at(&self.bytes, i))),
        )
    }

    /// Wire form: `pad` zero bits followed by the bits, right-aligned in whole bytes.
    /// `pad + len` must be a multiple of 8.
    pub(crate) fn to_padded(&self, pad: usize) -> Vec<u8> {
        let total = pad + self.len;
        let mut out = vec![0u8; total.div_ceil(8)];
        for i in 0..self.len {
            if bit_at(&self.bytes, i) {
                let pos = pad + i;
                out[pos / 8] |= 0x80 >> (pos % 8);
            }
        }
        out
    }

    /// Inverse of [`BitString::to_padded`]. The pad bits must be zero.
    pub(crate) fn from_padded(payload: &[u8], pad: usize) -> Option<Self> {
        let total = payload.len() * 8;
        if pad > total || (0..pad).any(|i| bit_at(payload, i)) {
            return None;
        }
        Some((pad..total).map(|i| bit_at(payload, i)).collect())
    }
}

impl Default for BitString {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bits = BitString::new();
        for bit in iter {
            bits.push(bit);
        }
        bits
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b'")?;
        for i in 0..self.len {
            f.write_str(if bit_at(&self.bytes, i) { "1" } else { "0" })?;
        }
        write!(f, "'")
    }
}

fn bit_at(bytes: &[u8], idx: usize) -> bool {
    bytes[idx / 8] & (0x80 >> (idx % 8)) != 0
}

// ============================================================================
// Conversions into Value
// ============================================================================

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )+
    };
}

impl_from_for_value!(
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    Decimal => Decimal,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => NaiveDateTime,
    DateTime<FixedOffset> => DateTime,
    Vec<u8> => Binary,
    String => Text,
    serde_json::Value => Json,
    BitString => Bit,
    Geometry => Geometry,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Binary(v.to_vec())
    }
}

impl From<DateTime<chrono::Utc>> for Value {
    fn from(v: DateTime<chrono::Utc>) -> Self {
        Value::DateTime(v.fixed_offset())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
