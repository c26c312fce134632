//! Binary protocol parameter encoding for prepared statements.
//!
//! Dispatch is on the value alone; the server is told the type through the
//! tag returned next to the payload.

use chrono::{Datelike, NaiveDateTime, NaiveTime};
use zerocopy::IntoBytes;

use crate::constant::ColumnType;
use crate::error::{Error, Result};
use crate::json::JsonCodec;
use crate::protocol::primitive::*;
use crate::protocol::value::{
    NullBitmap, Time8, Time12, Timestamp4, Timestamp7, Timestamp11, microsecond_of, set_param_null,
};
use crate::value::{BitString, Value};

/// Unsigned flag byte sent after each parameter type. Integers always go out signed.
const SIGNED: u8 = 0x00;

/// Encode one parameter into its wire type tag and binary payload.
///
/// Temporal payloads and length-encoded payloads include their length prefix.
pub fn encode_param(value: &Value, json: &dyn JsonCodec) -> Result<(ColumnType, Vec<u8>)> {
    let mut out = Vec::new();
    let ty = write_param(value, json, &mut out)?;
    Ok((ty, out))
}

/// The parameter section of `COM_STMT_EXECUTE`, split into its parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedParams {
    /// `(n + 7) / 8` bytes, bit `i` set if parameter `i` is NULL
    pub null_bitmap: Vec<u8>,
    /// 2 bytes per parameter: type code, unsigned flag
    pub types: Vec<u8>,
    /// Payloads of the non-NULL parameters, in order
    pub values: Vec<u8>,
}

/// Encode a whole parameter list.
pub fn encode_params(params: &[Value], json: &dyn JsonCodec) -> Result<EncodedParams> {
    let mut encoded = EncodedParams {
        null_bitmap: vec![0; NullBitmap::parameters_len(params.len())],
        types: Vec::with_capacity(params.len() * 2),
        values: Vec::new(),
    };

    for (idx, param) in params.iter().enumerate() {
        if param.is_null() {
            set_param_null(&mut encoded.null_bitmap, idx);
        }
        let ty = write_param(param, json, &mut encoded.values)?;
        encoded.types.push(ty.code());
        encoded.types.push(SIGNED);
    }
    Ok(encoded)
}

fn write_param(value: &Value, json: &dyn JsonCodec, out: &mut Vec<u8>) -> Result<ColumnType> {
    match value {
        // NULL values don't write anything
        Value::Null => Ok(ColumnType::MYSQL_TYPE_NULL),

        Value::Bool(v) => {
            write_int_1(out, u8::from(*v));
            Ok(ColumnType::MYSQL_TYPE_TINY)
        }

        Value::Int8(v) => write_longlong(out, i64::from(*v)),
        Value::Int16(v) => write_longlong(out, i64::from(*v)),
        Value::Int32(v) => write_longlong(out, i64::from(*v)),
        Value::Int64(v) => write_longlong(out, *v),
        Value::UInt8(v) => write_longlong(out, i64::from(*v)),
        Value::UInt16(v) => write_longlong(out, i64::from(*v)),
        Value::UInt32(v) => write_longlong(out, i64::from(*v)),
        Value::UInt64(v) => {
            let signed = i64::try_from(*v).map_err(|_| {
                Error::InvalidParameterValue(format!(
                    "{} does not fit a signed 64-bit parameter",
                    v
                ))
            })?;
            write_longlong(out, signed)
        }

        Value::Float32(v) => write_double(out, f64::from(*v), value),
        Value::Float64(v) => write_double(out, *v, value),

        Value::Decimal(d) => {
            write_bytes_lenenc(out, d.as_str().as_bytes());
            Ok(ColumnType::MYSQL_TYPE_NEWDECIMAL)
        }

        Value::Date(d) => {
            check_year(d.year(), value)?;
            write_temporal(out, Timestamp4::from(*d).as_bytes());
            Ok(ColumnType::MYSQL_TYPE_DATE)
        }
        Value::ZeroDate => {
            write_temporal(out, &[0; 4]);
            Ok(ColumnType::MYSQL_TYPE_DATE)
        }

        Value::Time(t) => {
            write_time(out, *t);
            Ok(ColumnType::MYSQL_TYPE_TIME)
        }

        Value::NaiveDateTime(dt) => {
            check_year(dt.year(), value)?;
            write_datetime(out, *dt);
            Ok(ColumnType::MYSQL_TYPE_DATETIME)
        }
        Value::DateTime(dt) => {
            if dt.offset().local_minus_utc() != 0 {
                return Err(Error::NotUTC(dt.to_rfc3339()));
            }
            let naive = dt.naive_utc();
            check_year(naive.year(), value)?;
            write_datetime(out, naive);
            Ok(ColumnType::MYSQL_TYPE_DATETIME)
        }
        Value::ZeroDateTime => {
            write_temporal(out, &[0; 7]);
            Ok(ColumnType::MYSQL_TYPE_DATETIME)
        }

        Value::Binary(bytes) => {
            write_bytes_lenenc(out, bytes);
            Ok(ColumnType::MYSQL_TYPE_VAR_STRING)
        }
        Value::Text(s) => {
            write_bytes_lenenc(out, s.as_bytes());
            Ok(ColumnType::MYSQL_TYPE_VAR_STRING)
        }
        Value::Json(doc) => {
            write_bytes_lenenc(out, &json.encode(doc)?);
            Ok(ColumnType::MYSQL_TYPE_VAR_STRING)
        }

        Value::Bit(bits) => {
            write_bytes_lenenc(out, &encode_bit(bits));
            Ok(ColumnType::MYSQL_TYPE_BIT)
        }

        Value::Geometry(_) => Err(Error::InvalidParameterValue(format!(
            "no parameter encoding for {:?}",
            value
        ))),
    }
}

fn write_longlong(out: &mut Vec<u8>, v: i64) -> Result<ColumnType> {
    write_int_8(out, v as u64);
    Ok(ColumnType::MYSQL_TYPE_LONGLONG)
}

fn write_double(out: &mut Vec<u8>, v: f64, value: &Value) -> Result<ColumnType> {
    if !v.is_finite() {
        return Err(Error::InvalidParameterValue(format!(
            "MySQL has no representation for {:?}",
            value
        )));
    }
    write_int_8(out, v.to_bits());
    Ok(ColumnType::MYSQL_TYPE_DOUBLE)
}

fn check_year(year: i32, value: &Value) -> Result<()> {
    if (0..=9999).contains(&year) {
        Ok(())
    } else {
        Err(Error::InvalidParameterValue(format!(
            "year {} out of range in {:?}",
            year, value
        )))
    }
}

fn write_temporal(out: &mut Vec<u8>, body: &[u8]) {
    write_int_1(out, body.len() as u8);
    out.extend_from_slice(body);
}

/// Shortest layout: 0 bytes for midnight, 8 without microseconds, 12 with
fn write_time(out: &mut Vec<u8>, t: NaiveTime) {
    if t == NaiveTime::MIN {
        write_temporal(out, &[]);
    } else if microsecond_of(t) == 0 {
        write_temporal(out, Time8::from(t).as_bytes());
    } else {
        write_temporal(out, Time12::from(t).as_bytes());
    }
}

/// 7 bytes without microseconds, 11 with
fn write_datetime(out: &mut Vec<u8>, dt: NaiveDateTime) {
    if microsecond_of(dt.time()) == 0 {
        write_temporal(out, Timestamp7::from(dt).as_bytes());
    } else {
        write_temporal(out, Timestamp11::from(dt).as_bytes());
    }
}

/// Left-pad to a byte boundary with `8 - (len mod 8)` zero bits
fn encode_bit(bits: &BitString) -> Vec<u8> {
    bits.to_padded(8 - bits.len() % 8)
}
