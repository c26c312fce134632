//! End-to-end tests through the public `RowCodec` surface
//!
//! Parameters encoded by the codec are fed back through the binary row
//! decoder as a server would echo them, and text rows are built the way
//! `COM_QUERY` result sets carry them.

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use mysql_rowcodec::geometry::Geometry;
use mysql_rowcodec::protocol::command::ColumnDefinition;
use mysql_rowcodec::protocol::primitive::write_bytes_lenenc;
use mysql_rowcodec::{
    BitString, ColumnDescriptor, ColumnType, Decimal, Error, Opts, RowCodec, Value,
};
use pretty_assertions::assert_eq;

fn codec() -> RowCodec {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
    RowCodec::default()
}

fn col(type_code: ColumnType) -> ColumnDescriptor {
    ColumnDescriptor::new(type_code, false, 0)
}

/// Assemble a binary protocol row from per-column payloads; `None` is NULL
fn binary_row(values: &[Option<Vec<u8>>]) -> Vec<u8> {
    let mut bitmap = vec![0u8; (values.len() + 9) / 8];
    let mut body = Vec::new();
    for (idx, value) in values.iter().enumerate() {
        match value {
            None => bitmap[(idx + 2) / 8] |= 1 << ((idx + 2) % 8),
            Some(payload) => body.extend_from_slice(payload),
        }
    }
    let mut row = vec![0x00];
    row.extend_from_slice(&bitmap);
    row.extend_from_slice(&body);
    row
}

/// Assemble a text protocol row; `None` is NULL
fn text_row(fields: &[Option<&str>]) -> Vec<u8> {
    let mut row = Vec::new();
    for field in fields {
        match field {
            None => row.push(0xFB),
            Some(text) => write_bytes_lenenc(&mut row, text.as_bytes()),
        }
    }
    row
}

/// Encode `value`, then decode the payload as a one-column row of `column`
fn roundtrip(codec: &RowCodec, value: &Value, column: ColumnDescriptor) -> Value {
    let (_, payload) = codec.encode_param(value).unwrap();
    let row = binary_row(&[Some(payload)]);
    let mut decoded = codec.decode_binary_row(&row, &[column]).unwrap();
    assert_eq!(decoded.len(), 1);
    decoded.remove(0)
}

#[test]
fn param_roundtrip_through_binary_rows() {
    let codec = codec();
    let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let utc = Utc
        .with_ymd_and_hms(2038, 1, 19, 3, 14, 7)
        .unwrap()
        .fixed_offset();

    let cases = [
        (Value::Int64(i64::MIN), col(ColumnType::MYSQL_TYPE_LONGLONG)),
        (Value::Float64(6.02214076e23), col(ColumnType::MYSQL_TYPE_DOUBLE)),
        (
            Value::Decimal("-99999999999999999999.000000000001".parse::<Decimal>().unwrap()),
            col(ColumnType::MYSQL_TYPE_NEWDECIMAL),
        ),
        (Value::Date(date), col(ColumnType::MYSQL_TYPE_DATE)),
        (Value::ZeroDate, col(ColumnType::MYSQL_TYPE_DATE)),
        (Value::Time(NaiveTime::MIN), col(ColumnType::MYSQL_TYPE_TIME)),
        (
            Value::Time(NaiveTime::from_hms_opt(23, 59, 59).unwrap()),
            col(ColumnType::MYSQL_TYPE_TIME),
        ),
        (
            Value::Time(NaiveTime::from_hms_micro_opt(0, 0, 0, 1).unwrap()),
            col(ColumnType::MYSQL_TYPE_TIME),
        ),
        (
            Value::NaiveDateTime(date.and_hms_opt(12, 0, 0).unwrap()),
            col(ColumnType::MYSQL_TYPE_DATETIME),
        ),
        (
            Value::NaiveDateTime(date.and_hms_micro_opt(12, 0, 0, 999_999).unwrap()),
            col(ColumnType::MYSQL_TYPE_DATETIME),
        ),
        (Value::ZeroDateTime, col(ColumnType::MYSQL_TYPE_DATETIME)),
        (Value::DateTime(utc), col(ColumnType::MYSQL_TYPE_TIMESTAMP)),
        (
            Value::Binary(vec![0xFB; 70_000]),
            col(ColumnType::MYSQL_TYPE_LONG_BLOB),
        ),
    ];

    for (value, column) in cases {
        assert_eq!(roundtrip(&codec, &value, column), value);
    }
}

#[test]
fn narrow_integers_come_back_as_longlong() {
    let codec = codec();
    let value = roundtrip(
        &codec,
        &Value::UInt16(65535),
        col(ColumnType::MYSQL_TYPE_LONGLONG),
    );
    assert_eq!(value, Value::Int64(65535));
}

#[test]
fn json_param_decodes_as_json_column() {
    let codec = codec();
    let doc = serde_json::json!({"tags": ["a", "b"], "n": 1.5, "ok": true});
    let value = roundtrip(
        &codec,
        &Value::Json(doc.clone()),
        col(ColumnType::MYSQL_TYPE_JSON),
    );
    assert_eq!(value, Value::Json(doc));
}

#[test]
fn bit_roundtrip_all_sizes() {
    let codec = codec();
    for size in 1..=64usize {
        let patterns = [0u64, u64::MAX, 0xA5A5_5A5A_F00F_0FF0, 1];
        for pattern in patterns {
            let masked = if size == 64 {
                pattern
            } else {
                pattern & ((1u64 << size) - 1)
            };
            let bits = BitString::from_u64(masked, size).unwrap();
            let column = ColumnDescriptor::new(ColumnType::MYSQL_TYPE_BIT, false, size as u32);

            let (tag, payload) = codec.encode_param(&Value::Bit(bits.clone())).unwrap();
            assert_eq!(tag, ColumnType::MYSQL_TYPE_BIT);
            assert_eq!(payload[0] as usize, size / 8 + 1, "BIT({})", size);

            let decoded = roundtrip(&codec, &Value::Bit(bits.clone()), column);
            assert_eq!(decoded, Value::Bit(bits), "BIT({}) = {:#x}", size, masked);
        }
    }
}

#[test]
fn strict_bit_padding_rejects_minimal_pad() {
    let strict = RowCodec::new(Opts {
        strict_bit_padding: true,
        ..Opts::default()
    });
    let lenient = codec();
    let column = ColumnDescriptor::new(ColumnType::MYSQL_TYPE_BIT, false, 16);
    let row = binary_row(&[Some(vec![2, 0xBE, 0xEF])]);

    assert_eq!(
        lenient.decode_binary_row(&row, &[column]).unwrap(),
        vec![Value::Bit(BitString::from_u64(0xBEEF, 16).unwrap())]
    );
    assert!(matches!(
        strict.decode_binary_row(&row, &[column]),
        Err(Error::RowDecodeError(_))
    ));
}

#[test]
fn all_null_rows() {
    let codec = codec();
    let columns: Vec<_> = ColumnType::ALL.iter().map(|ty| col(*ty)).collect();

    let binary = binary_row(&vec![None; columns.len()]);
    let text = text_row(&vec![None; columns.len()]);

    let expected = vec![Value::Null; columns.len()];
    assert_eq!(codec.decode_binary_row(&binary, &columns).unwrap(), expected);
    assert_eq!(codec.decode_text_row(&text, &columns).unwrap(), expected);
}

#[test]
fn zero_dates_through_both_protocols() {
    let codec = codec();
    let columns = [
        col(ColumnType::MYSQL_TYPE_DATE),
        col(ColumnType::MYSQL_TYPE_DATETIME),
        col(ColumnType::MYSQL_TYPE_TIMESTAMP),
    ];
    let expected = vec![Value::ZeroDate, Value::ZeroDateTime, Value::ZeroDateTime];

    let text = text_row(&[
        Some("0000-00-00"),
        Some("0000-00-00 00:00:00"),
        Some("0000-00-00 00:00:00"),
    ]);
    assert_eq!(codec.decode_text_row(&text, &columns).unwrap(), expected);

    let binary = binary_row(&[Some(vec![0]), Some(vec![0]), Some(vec![0])]);
    assert_eq!(codec.decode_binary_row(&binary, &columns).unwrap(), expected);
}

#[test]
fn datetime_payload_lengths() {
    let codec = codec();
    let dt = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();

    let (_, payload) = codec
        .encode_param(&Value::NaiveDateTime(dt.and_hms_opt(1, 2, 3).unwrap()))
        .unwrap();
    assert_eq!(payload.len(), 8);
    assert_eq!(payload[0], 7);

    let (_, payload) = codec
        .encode_param(&Value::NaiveDateTime(
            dt.and_hms_micro_opt(1, 2, 3, 4).unwrap(),
        ))
        .unwrap();
    assert_eq!(payload.len(), 12);
    assert_eq!(payload[0], 11);
}

#[test]
fn non_utc_datetime_is_rejected() {
    let codec = codec();
    let tz = FixedOffset::west_opt(5 * 3600).unwrap();
    let dt = tz.with_ymd_and_hms(2024, 7, 4, 9, 0, 0).unwrap();
    assert!(matches!(
        codec.encode_param(&Value::DateTime(dt)),
        Err(Error::NotUTC(_))
    ));
}

#[test]
fn geometry_column() {
    let codec = codec();
    let mut wkb = 4326u32.to_le_bytes().to_vec();
    wkb.push(0x01);
    wkb.extend_from_slice(&1u32.to_le_bytes());
    wkb.extend_from_slice(&127.0f64.to_le_bytes());
    wkb.extend_from_slice(&37.5f64.to_le_bytes());

    let mut payload = Vec::new();
    write_bytes_lenenc(&mut payload, &wkb);
    let row = binary_row(&[Some(payload)]);

    let decoded = codec
        .decode_binary_row(&row, &[col(ColumnType::MYSQL_TYPE_GEOMETRY)])
        .unwrap();
    assert_eq!(
        decoded,
        vec![Value::Geometry(Geometry::Point {
            x: 127.0,
            y: 37.5,
            srid: Some(4326),
        })]
    );
}

#[test]
fn unknown_type_code_in_column_definition() {
    let mut packet = Vec::new();
    for field in ["def", "db", "t", "t", "c", "c"] {
        write_bytes_lenenc(&mut packet, field.as_bytes());
    }
    packet.push(0x0c);
    packet.extend_from_slice(&[0x3f, 0x00, 1, 0, 0, 0, 0x13, 0, 0, 0, 0, 0]);

    let def = ColumnDefinition::try_from(packet.as_slice()).unwrap();
    assert!(matches!(def.descriptor(), Err(Error::UnknownTypeCode(0x13))));
}

#[test]
fn column_count_mismatch() {
    let codec = codec();
    let columns = [col(ColumnType::MYSQL_TYPE_LONG), col(ColumnType::MYSQL_TYPE_LONG)];

    let text = text_row(&[Some("1"), Some("2"), Some("3")]);
    assert!(matches!(
        codec.decode_text_row(&text, &columns),
        Err(Error::RowColumnCountMismatch {
            expected: 2,
            actual: 3
        })
    ));

    // the binary value stream has no field markers, so surplus shows up as trailing bytes
    let binary = binary_row(&[
        Some(1i32.to_le_bytes().to_vec()),
        Some(2i32.to_le_bytes().to_vec()),
        Some(3i32.to_le_bytes().to_vec()),
    ]);
    assert!(codec.decode_binary_row(&binary, &columns).is_err());
}

#[test]
fn encode_params_section() {
    let codec = codec();
    let params = [
        Value::from(1i64),
        Value::from(None::<i32>),
        Value::from("x"),
    ];
    let encoded = codec.encode_params(&params).unwrap();
    assert_eq!(encoded.null_bitmap, vec![0b0000_0010]);
    assert_eq!(encoded.types, vec![0x08, 0x00, 0x06, 0x00, 0xFD, 0x00]);
    assert_eq!(encoded.values.len(), 8 + 2);
}

#[test]
fn codec_is_shareable() {
    fn assert_send_sync<T: Send + Sync + Clone>() {}
    assert_send_sync::<RowCodec>();

    let codec = codec();
    let columns = [col(ColumnType::MYSQL_TYPE_TINY)];
    std::thread::scope(|s| {
        for i in 0..4u8 {
            let codec = codec.clone();
            let columns = &columns;
            s.spawn(move || {
                let row = binary_row(&[Some(vec![i])]);
                assert_eq!(
                    codec.decode_binary_row(&row, columns).unwrap(),
                    vec![Value::Int8(i as i8)]
                );
            });
        }
    });
}
