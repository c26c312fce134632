//! Text protocol row decoding.
//!
//! A text row is one length-encoded string per column; a lone `0xFB` is NULL.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use simdutf8::basic::from_utf8;

use crate::col::{ColumnDescriptor, SemanticType};
use crate::error::{Error, Result};
use crate::geometry::decode_geometry;
use crate::opts::Opts;
use crate::protocol::TextRowPayload;
use crate::protocol::primitive::read_string_lenenc_nullable;
use crate::raw::decode_bit;
use crate::value::{Decimal, Value};

const ZERO_DATE: &[u8] = b"0000-00-00";
const ZERO_DATETIME: &[u8] = b"0000-00-00 00:00:00";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Decode every column of a text protocol row.
pub fn decode_text_row(
    row: TextRowPayload<'_>,
    columns: &[ColumnDescriptor],
    opts: &Opts,
) -> Result<Vec<Value>> {
    let mut data = row.0;
    let mut values = Vec::with_capacity(columns.len());

    for (idx, col) in columns.iter().enumerate() {
        if data.is_empty() {
            return Err(Error::RowColumnCountMismatch {
                expected: columns.len(),
                actual: idx,
            });
        }
        let (field, rest) = read_string_lenenc_nullable(data)?;
        let value = match field {
            None => Value::Null,
            Some(text) => parse_text_value(col.semantic_type(), text, opts).inspect_err(|e| {
                tracing::debug!(column = idx, error = %e, "text column decode failed")
            })?,
        };
        values.push(value);
        data = rest;
    }

    if !data.is_empty() {
        return Err(Error::RowColumnCountMismatch {
            expected: columns.len(),
            actual: columns.len() + count_fields(data),
        });
    }
    Ok(values)
}

/// Number of fields in the surplus part of a row, at least 1
fn count_fields(mut data: &[u8]) -> usize {
    let mut count = 0;
    while !data.is_empty() {
        match read_string_lenenc_nullable(data) {
            Ok((_, rest)) => data = rest,
            Err(_) => break,
        }
        count += 1;
    }
    count.max(1)
}

/// Convert the textual form of one column into its value.
pub fn parse_text_value(ty: SemanticType, text: &[u8], opts: &Opts) -> Result<Value> {
    match ty {
        SemanticType::Null => Ok(Value::Null),

        SemanticType::UInt8 => parse_int(text).map(Value::UInt8),
        SemanticType::Int8 => parse_int(text).map(Value::Int8),
        SemanticType::UInt16 => parse_int(text).map(Value::UInt16),
        SemanticType::Int16 => parse_int(text).map(Value::Int16),
        SemanticType::UInt32 => parse_int(text).map(Value::UInt32),
        SemanticType::Int32 => parse_int(text).map(Value::Int32),
        SemanticType::UInt64 => parse_int(text).map(Value::UInt64),
        SemanticType::Int64 => parse_int(text).map(Value::Int64),

        SemanticType::Float32 => parse_float(text).map(Value::Float32),
        SemanticType::Float64 => parse_float(text).map(Value::Float64),

        SemanticType::Decimal => Decimal::from_bytes(text).map(Value::Decimal),

        SemanticType::Date => {
            if text == ZERO_DATE {
                return Ok(Value::ZeroDate);
            }
            let s = temporal_str(text)?;
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| Error::MalformedTemporalLiteral(s.to_owned()))
        }

        SemanticType::Time => parse_time(temporal_str(text)?).map(Value::Time),

        SemanticType::NaiveDateTime => {
            Ok(parse_datetime(text)?.map_or(Value::ZeroDateTime, Value::NaiveDateTime))
        }

        SemanticType::DateTime => Ok(parse_datetime(text)?.map_or(Value::ZeroDateTime, |naive| {
            Value::DateTime(naive.and_utc().fixed_offset())
        })),

        SemanticType::Binary => Ok(Value::Binary(text.to_vec())),
        SemanticType::Json => opts.json.decode(text).map(Value::Json),
        SemanticType::Bit(size) => {
            decode_bit(text, size, opts.strict_bit_padding).map(Value::Bit)
        }
        SemanticType::Geometry => decode_geometry(text).map(Value::Geometry),
    }
}

fn lossy(text: &[u8]) -> String {
    String::from_utf8_lossy(text).into_owned()
}

/// Plain base-10: `str::parse` would also take a leading `+`
fn parse_int<T: FromStr>(text: &[u8]) -> Result<T> {
    from_utf8(text)
        .ok()
        .filter(|s| !s.starts_with('+'))
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::MalformedIntegerLiteral(lossy(text)))
}

/// Digits, sign, decimal point and exponent only: no `inf`/`NaN` spellings,
/// and no literal that overflows to infinity
fn parse_float<T: FromStr + Copy + Into<f64>>(text: &[u8]) -> Result<T> {
    let well_formed = !text.is_empty()
        && text
            .iter()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    well_formed
        .then(|| from_utf8(text).ok())
        .flatten()
        .and_then(|s| s.parse::<T>().ok())
        .filter(|v| Into::<f64>::into(*v).is_finite())
        .ok_or_else(|| Error::MalformedFloatLiteral(lossy(text)))
}

fn temporal_str(text: &[u8]) -> Result<&str> {
    from_utf8(text).map_err(|_| Error::MalformedTemporalLiteral(lossy(text)))
}

/// `HH:MM:SS[.ffffff]` within one day
fn parse_time(s: &str) -> Result<NaiveTime> {
    if s.starts_with('-') {
        return Err(Error::UnsupportedTimeRange(format!("negative time {}", s)));
    }
    let hours: u32 = s
        .split_once(':')
        .and_then(|(h, _)| h.parse().ok())
        .ok_or_else(|| Error::MalformedTemporalLiteral(s.to_owned()))?;
    if hours >= 24 {
        return Err(Error::UnsupportedTimeRange(format!(
            "time {} exceeds one day",
            s
        )));
    }
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|_| Error::MalformedTemporalLiteral(s.to_owned()))
}

/// `None` for the zero datetime, including its fractional-second forms
fn parse_datetime(text: &[u8]) -> Result<Option<NaiveDateTime>> {
    if let Some(fraction) = text.strip_prefix(ZERO_DATETIME) {
        let zero_fraction = match fraction.split_first() {
            None => true,
            Some((b'.', digits)) => digits.iter().all(|d| *d == b'0'),
            Some(_) => false,
        };
        if zero_fraction {
            return Ok(None);
        }
    }
    let s = temporal_str(text)?;
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map(Some)
        .map_err(|_| Error::MalformedTemporalLiteral(s.to_owned()))
}
