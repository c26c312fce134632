use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use pretty_assertions::assert_eq;

use crate::col::{ColumnDescriptor, SemanticType};
use crate::constant::ColumnType;
use crate::error::Error;
use crate::opts::Opts;
use crate::protocol::TextRowPayload;
use crate::text::{decode_text_row, parse_text_value};
use crate::value::{BitString, Value};

fn parse(ty: SemanticType, text: &[u8]) -> Result<Value, Error> {
    parse_text_value(ty, text, &Opts::default())
}

/// Length-encode each field; `None` becomes the NULL marker
fn text_row(fields: &[Option<&[u8]>]) -> Vec<u8> {
    let mut out = Vec::new();
    for field in fields {
        match field {
            None => out.push(0xFB),
            Some(bytes) => crate::protocol::primitive::write_bytes_lenenc(&mut out, bytes),
        }
    }
    out
}

#[test]
fn test_integers() {
    assert_eq!(parse(SemanticType::Int8, b"-128").unwrap(), Value::Int8(-128));
    assert_eq!(
        parse(SemanticType::UInt64, b"18446744073709551615").unwrap(),
        Value::UInt64(u64::MAX)
    );
    assert_eq!(parse(SemanticType::UInt16, b"2024").unwrap(), Value::UInt16(2024));

    let bad_literals: [&[u8]; 7] = [b"12a", b"", b" 1", b"1.0", b"256", b"+5", b"+"];
    for bad in bad_literals {
        assert!(
            matches!(
                parse(SemanticType::UInt8, bad),
                Err(Error::MalformedIntegerLiteral(_))
            ),
            "{:?}",
            bad
        );
    }
}

#[test]
fn test_floats() {
    assert_eq!(
        parse(SemanticType::Float64, b"-1.5e3").unwrap(),
        Value::Float64(-1500.0)
    );
    assert_eq!(
        parse(SemanticType::Float32, b"0.25").unwrap(),
        Value::Float32(0.25)
    );
    let bad_literals: [&[u8]; 4] = [b"inf", b"NaN", b"1,5", b""];
    for bad in bad_literals {
        assert!(
            matches!(
                parse(SemanticType::Float64, bad),
                Err(Error::MalformedFloatLiteral(_))
            ),
            "{:?}",
            bad
        );
    }
    assert!(matches!(
        parse(SemanticType::Int64, b"+5"),
        Err(Error::MalformedIntegerLiteral(_))
    ));
    assert_eq!(parse(SemanticType::Int64, b"-5").unwrap(), Value::Int64(-5));
}

#[test]
fn test_out_of_range_floats_rejected() {
    assert!(matches!(
        parse(SemanticType::Float64, b"1e400"),
        Err(Error::MalformedFloatLiteral(_))
    ));
    assert!(matches!(
        parse(SemanticType::Float64, b"-1e400"),
        Err(Error::MalformedFloatLiteral(_))
    ));
    assert!(matches!(
        parse(SemanticType::Float32, b"1e39"),
        Err(Error::MalformedFloatLiteral(_))
    ));
    assert_eq!(
        parse(SemanticType::Float64, b"1.7976931348623157e308").unwrap(),
        Value::Float64(f64::MAX)
    );
}

#[test]
fn test_decimal_keeps_text() {
    let value = parse(SemanticType::Decimal, b"12345678901234567890.000000001").unwrap();
    match value {
        Value::Decimal(d) => assert_eq!(d.as_str(), "12345678901234567890.000000001"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_dates() {
    assert_eq!(parse(SemanticType::Date, b"0000-00-00").unwrap(), Value::ZeroDate);
    assert_eq!(
        parse(SemanticType::Date, b"1999-12-31").unwrap(),
        Value::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap())
    );
    assert!(matches!(
        parse(SemanticType::Date, b"1999-13-01"),
        Err(Error::MalformedTemporalLiteral(_))
    ));
}

#[test]
fn test_times() {
    assert_eq!(
        parse(SemanticType::Time, b"12:34:56").unwrap(),
        Value::Time(NaiveTime::from_hms_opt(12, 34, 56).unwrap())
    );
    assert_eq!(
        parse(SemanticType::Time, b"00:00:01.500000").unwrap(),
        Value::Time(NaiveTime::from_hms_micro_opt(0, 0, 1, 500_000).unwrap())
    );
    assert!(matches!(
        parse(SemanticType::Time, b"-01:00:00"),
        Err(Error::UnsupportedTimeRange(_))
    ));
    assert!(matches!(
        parse(SemanticType::Time, b"838:59:59"),
        Err(Error::UnsupportedTimeRange(_))
    ));
    assert!(matches!(
        parse(SemanticType::Time, b"noon"),
        Err(Error::MalformedTemporalLiteral(_))
    ));
}

#[test]
fn test_datetimes() {
    let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_micro_opt(4, 5, 6, 7)
        .unwrap();
    assert_eq!(
        parse(SemanticType::NaiveDateTime, b"2024-03-01 04:05:06.000007").unwrap(),
        Value::NaiveDateTime(dt)
    );
    assert_eq!(
        parse(SemanticType::NaiveDateTime, b"0000-00-00 00:00:00").unwrap(),
        Value::ZeroDateTime
    );
    assert_eq!(
        parse(SemanticType::DateTime, b"0000-00-00 00:00:00.000").unwrap(),
        Value::ZeroDateTime
    );
    assert_eq!(
        parse(SemanticType::DateTime, b"2024-03-01 04:05:06").unwrap(),
        Value::DateTime(
            Utc.with_ymd_and_hms(2024, 3, 1, 4, 5, 6)
                .unwrap()
                .fixed_offset()
        )
    );
    assert!(matches!(
        parse(SemanticType::NaiveDateTime, b"2024-03-01T04:05:06"),
        Err(Error::MalformedTemporalLiteral(_))
    ));
}

#[test]
fn test_passthrough_and_json() {
    assert_eq!(
        parse(SemanticType::Binary, b"\xFF\x00raw").unwrap(),
        Value::Binary(b"\xFF\x00raw".to_vec())
    );
    assert_eq!(
        parse(SemanticType::Json, br#"{"a":1}"#).unwrap(),
        Value::Json(serde_json::json!({"a": 1}))
    );
}

#[test]
fn test_bit() {
    assert_eq!(
        parse(SemanticType::Bit(4), &[0b0000_1001]).unwrap(),
        Value::Bit(BitString::from_u64(0b1001, 4).unwrap())
    );
}

#[test]
fn test_decode_text_row() {
    let columns = [
        ColumnDescriptor::new(ColumnType::MYSQL_TYPE_LONGLONG, false, 20),
        ColumnDescriptor::new(ColumnType::MYSQL_TYPE_VAR_STRING, false, 255),
        ColumnDescriptor::new(ColumnType::MYSQL_TYPE_DATE, false, 10),
    ];
    let raw = text_row(&[Some(b"-42".as_slice()), None, Some(b"0000-00-00".as_slice())]);

    let row = decode_text_row(TextRowPayload(&raw), &columns, &Opts::default()).unwrap();
    assert_eq!(row, vec![Value::Int64(-42), Value::Null, Value::ZeroDate]);
}

#[test]
fn test_empty_string_is_not_null() {
    let columns = [ColumnDescriptor::new(ColumnType::MYSQL_TYPE_STRING, false, 1)];
    let raw = text_row(&[Some(b"".as_slice())]);
    let row = decode_text_row(TextRowPayload(&raw), &columns, &Opts::default()).unwrap();
    assert_eq!(row, vec![Value::Binary(vec![])]);
}

#[test]
fn test_column_count_mismatch() {
    let columns = [
        ColumnDescriptor::new(ColumnType::MYSQL_TYPE_TINY, false, 4),
        ColumnDescriptor::new(ColumnType::MYSQL_TYPE_TINY, false, 4),
    ];

    let short = text_row(&[Some(b"1".as_slice())]);
    assert!(matches!(
        decode_text_row(TextRowPayload(&short), &columns, &Opts::default()),
        Err(Error::RowColumnCountMismatch {
            expected: 2,
            actual: 1
        })
    ));

    let long = text_row(&[
        Some(b"1".as_slice()),
        Some(b"2".as_slice()),
        None,
        Some(b"4".as_slice()),
    ]);
    assert!(matches!(
        decode_text_row(TextRowPayload(&long), &columns, &Opts::default()),
        Err(Error::RowColumnCountMismatch {
            expected: 2,
            actual: 4
        })
    ));
}

#[test]
fn test_bad_column_aborts_row() {
    let columns = [
        ColumnDescriptor::new(ColumnType::MYSQL_TYPE_LONG, false, 11),
        ColumnDescriptor::new(ColumnType::MYSQL_TYPE_LONG, false, 11),
    ];
    let raw = text_row(&[Some(b"1".as_slice()), Some(b"x".as_slice())]);
    assert!(matches!(
        decode_text_row(TextRowPayload(&raw), &columns, &Opts::default()),
        Err(Error::MalformedIntegerLiteral(_))
    ));
}

#[test]
fn test_geometry_text_is_wkb() {
    let mut payload = 0u32.to_le_bytes().to_vec();
    payload.push(0x01);
    payload.extend_from_slice(&1u32.to_le_bytes());
    payload.extend_from_slice(&(-1.0f64).to_le_bytes());
    payload.extend_from_slice(&2.0f64.to_le_bytes());

    assert_eq!(
        parse(SemanticType::Geometry, &payload).unwrap(),
        Value::Geometry(crate::geometry::Geometry::Point {
            x: -1.0,
            y: 2.0,
            srid: None,
        })
    );
}
