//! Binary protocol row decoding.
//!
//! A binary row is a `0x00` header, a NULL bitmap with a 2-bit offset, and one
//! value per non-NULL column laid out according to its type.

use chrono::{NaiveDateTime, NaiveTime};
use zerocopy::FromBytes;

use crate::col::{ColumnDescriptor, SemanticType};
use crate::error::{Error, Result};
use crate::geometry::decode_geometry;
use crate::opts::Opts;
use crate::protocol::BinaryRowPayload;
use crate::protocol::primitive::*;
use crate::protocol::value::{Time8, Time12, Timestamp4, Timestamp7, Timestamp11};
use crate::value::{BitString, Decimal, Value};

/// Decode every column of a binary protocol row.
///
/// The value stream must be consumed exactly; leftover bytes mean the row
/// and the column metadata disagree.
pub fn decode_binary_row(
    payload: &[u8],
    columns: &[ColumnDescriptor],
    opts: &Opts,
) -> Result<Vec<Value>> {
    let row = BinaryRowPayload::parse(payload, columns.len())?;
    let null_bitmap = row.null_bitmap();
    let mut data = row.values();
    let mut values = Vec::with_capacity(columns.len());

    for (idx, col) in columns.iter().enumerate() {
        let (value, rest) = parse_value(col.semantic_type(), null_bitmap.is_null(idx), data, opts)
            .inspect_err(|e| {
                tracing::debug!(column = idx, error = %e, "binary column decode failed")
            })?;
        values.push(value);
        data = rest;
    }

    if !data.is_empty() {
        return Err(Error::row(format!(
            "{} trailing bytes after {} columns",
            data.len(),
            columns.len()
        )));
    }
    Ok(values)
}

/// Parse a single value from binary data.
///
/// Returns the parsed value and remaining bytes.
pub fn parse_value<'buf>(
    ty: SemanticType,
    is_null: bool,
    data: &'buf [u8],
    opts: &Opts,
) -> Result<(Value, &'buf [u8])> {
    if is_null {
        return Ok((Value::Null, data));
    }

    match ty {
        SemanticType::Null => Ok((Value::Null, data)),

        // Integer types
        SemanticType::UInt8 => {
            let (val, rest) = read_int_1(data)?;
            Ok((Value::UInt8(val), rest))
        }
        SemanticType::Int8 => {
            let (val, rest) = read_int_1(data)?;
            Ok((Value::Int8(val as i8), rest))
        }
        SemanticType::UInt16 => {
            let (val, rest) = read_int_2(data)?;
            Ok((Value::UInt16(val), rest))
        }
        SemanticType::Int16 => {
            let (val, rest) = read_int_2(data)?;
            Ok((Value::Int16(val as i16), rest))
        }
        SemanticType::UInt32 => {
            let (val, rest) = read_int_4(data)?;
            Ok((Value::UInt32(val), rest))
        }
        SemanticType::Int32 => {
            let (val, rest) = read_int_4(data)?;
            Ok((Value::Int32(val as i32), rest))
        }
        SemanticType::UInt64 => {
            let (val, rest) = read_int_8(data)?;
            Ok((Value::UInt64(val), rest))
        }
        SemanticType::Int64 => {
            let (val, rest) = read_int_8(data)?;
            Ok((Value::Int64(val as i64), rest))
        }

        // Floating point types
        SemanticType::Float32 => {
            let (val, rest) = read_int_4(data)?;
            Ok((Value::Float32(f32::from_bits(val)), rest))
        }
        SemanticType::Float64 => {
            let (val, rest) = read_int_8(data)?;
            Ok((Value::Float64(f64::from_bits(val)), rest))
        }

        SemanticType::Decimal => {
            let (bytes, rest) = read_string_lenenc(data)?;
            Ok((Value::Decimal(Decimal::from_bytes(bytes)?), rest))
        }

        // Temporal types - one length byte, then 0/4/7/8/11/12 bytes
        SemanticType::Date => {
            let (body, rest) = read_temporal(data)?;
            let value = match body.len() {
                0 => Value::ZeroDate,
                4 => {
                    let ts = Timestamp4::ref_from_bytes(body).map_err(Error::from_debug)?;
                    if ts.is_zero() {
                        tracing::trace!("zero date in 4-byte form");
                        Value::ZeroDate
                    } else {
                        Value::Date(ts.to_date()?)
                    }
                }
                len => return Err(Error::row(format!("invalid date length: {}", len))),
            };
            Ok((value, rest))
        }

        SemanticType::Time => {
            let (body, rest) = read_temporal(data)?;
            let time = match body.len() {
                0 => NaiveTime::MIN,
                8 => Time8::ref_from_bytes(body)
                    .map_err(Error::from_debug)?
                    .to_time()?,
                12 => Time12::ref_from_bytes(body)
                    .map_err(Error::from_debug)?
                    .to_time()?,
                len => return Err(Error::row(format!("invalid time length: {}", len))),
            };
            Ok((Value::Time(time), rest))
        }

        SemanticType::NaiveDateTime => {
            let (body, rest) = read_temporal(data)?;
            let value = parse_datetime(body)?.map_or(Value::ZeroDateTime, Value::NaiveDateTime);
            Ok((value, rest))
        }

        SemanticType::DateTime => {
            let (body, rest) = read_temporal(data)?;
            let value = parse_datetime(body)?.map_or(Value::ZeroDateTime, |naive| {
                Value::DateTime(naive.and_utc().fixed_offset())
            });
            Ok((value, rest))
        }

        // Length-encoded types
        SemanticType::Binary => {
            let (bytes, rest) = read_string_lenenc(data)?;
            Ok((Value::Binary(bytes.to_vec()), rest))
        }
        SemanticType::Json => {
            let (bytes, rest) = read_string_lenenc(data)?;
            Ok((Value::Json(opts.json.decode(bytes)?), rest))
        }
        SemanticType::Bit(size) => {
            let (bytes, rest) = read_string_lenenc(data)?;
            Ok((
                Value::Bit(decode_bit(bytes, size, opts.strict_bit_padding)?),
                rest,
            ))
        }
        SemanticType::Geometry => {
            let (bytes, rest) = read_string_lenenc(data)?;
            Ok((Value::Geometry(decode_geometry(bytes)?), rest))
        }
    }
}

/// Split off a temporal value body behind its 1-byte length
fn read_temporal(data: &[u8]) -> Result<(&[u8], &[u8])> {
    let (len, rest) = read_int_1(data)?;
    read_string_fix(rest, len as usize)
}

/// DATETIME/TIMESTAMP body. `None` is the zero datetime.
fn parse_datetime(body: &[u8]) -> Result<Option<NaiveDateTime>> {
    match body.len() {
        0 => Ok(None),
        4 => {
            let ts = Timestamp4::ref_from_bytes(body).map_err(Error::from_debug)?;
            if ts.is_zero() {
                return Ok(None);
            }
            Ok(Some(ts.to_date()?.and_time(NaiveTime::MIN)))
        }
        7 => {
            let ts = Timestamp7::ref_from_bytes(body).map_err(Error::from_debug)?;
            if ts.is_zero() {
                return Ok(None);
            }
            ts.to_datetime().map(Some)
        }
        11 => {
            let ts = Timestamp11::ref_from_bytes(body).map_err(Error::from_debug)?;
            if ts.is_zero() {
                return Ok(None);
            }
            ts.to_datetime().map(Some)
        }
        len => Err(Error::row(format!("invalid datetime length: {}", len))),
    }
}

/// Unpack a BIT(size) payload.
///
/// The server right-aligns the bits in whole bytes. The expected pad is
/// `8 - (size mod 8)`, a full byte when `size` is byte-aligned. Unless `strict`,
/// the minimal pad of zero bits for byte-aligned sizes is accepted too.
pub(crate) fn decode_bit(payload: &[u8], size: u32, strict: bool) -> Result<BitString> {
    let size = size as usize;
    let total = payload.len() * 8;
    let expected = 8 - size % 8;

    let pad = total.checked_sub(size).ok_or_else(|| {
        Error::row(format!(
            "BIT({}) payload has only {} bytes",
            size,
            payload.len()
        ))
    })?;
    if pad > 8 || (strict && pad != expected) {
        return Err(Error::row(format!(
            "BIT({}) payload of {} bytes has {} pad bits, expected {}",
            size,
            payload.len(),
            pad,
            expected
        )));
    }
    if pad != expected {
        tracing::trace!(size, pad, expected, "accepting non-standard BIT padding");
    }

    BitString::from_padded(payload, pad)
        .ok_or_else(|| Error::row(format!("BIT({}) payload has non-zero padding", size)))
}
