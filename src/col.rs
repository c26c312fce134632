use crate::constant::{ColumnFlags, ColumnType};
use crate::error::Result;

/// The per-column metadata the row decoders need.
///
/// Built once per result set and shared by every row of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub type_code: ColumnType,
    pub unsigned: bool,
    /// Declared length. For `BIT(M)` this is `M`.
    pub length: u32,
}

impl ColumnDescriptor {
    pub fn new(type_code: ColumnType, unsigned: bool, length: u32) -> Self {
        Self {
            type_code,
            unsigned,
            length,
        }
    }

    /// Build from the raw fields of a column definition packet
    pub fn from_raw(type_code: u8, flags: u16, length: u32) -> Result<Self> {
        let type_code = ColumnType::try_from(type_code)?;
        let flags = ColumnFlags::from_bits_truncate(flags);
        Ok(Self::new(
            type_code,
            flags.contains(ColumnFlags::UNSIGNED_FLAG),
            length,
        ))
    }

    pub fn semantic_type(&self) -> SemanticType {
        resolve(self)
    }
}

/// What a column decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
    Decimal,
    Date,
    Time,
    /// DATETIME: no zone semantics
    NaiveDateTime,
    /// TIMESTAMP: stored and returned as UTC
    DateTime,
    Binary,
    Json,
    Bit(u32),
    Geometry,
    Null,
}

/// Resolve a column descriptor to its decode target.
pub fn resolve(col: &ColumnDescriptor) -> SemanticType {
    let unsigned = col.unsigned;
    match col.type_code {
        ColumnType::MYSQL_TYPE_TINY if unsigned => SemanticType::UInt8,
        ColumnType::MYSQL_TYPE_TINY => SemanticType::Int8,
        ColumnType::MYSQL_TYPE_SHORT if unsigned => SemanticType::UInt16,
        ColumnType::MYSQL_TYPE_SHORT => SemanticType::Int16,
        // INT24 travels as 4 bytes in the binary protocol
        ColumnType::MYSQL_TYPE_INT24 | ColumnType::MYSQL_TYPE_LONG if unsigned => {
            SemanticType::UInt32
        }
        ColumnType::MYSQL_TYPE_INT24 | ColumnType::MYSQL_TYPE_LONG => SemanticType::Int32,
        ColumnType::MYSQL_TYPE_LONGLONG if unsigned => SemanticType::UInt64,
        ColumnType::MYSQL_TYPE_LONGLONG => SemanticType::Int64,
        ColumnType::MYSQL_TYPE_YEAR => SemanticType::UInt16,

        ColumnType::MYSQL_TYPE_FLOAT => SemanticType::Float32,
        ColumnType::MYSQL_TYPE_DOUBLE => SemanticType::Float64,
        ColumnType::MYSQL_TYPE_NEWDECIMAL => SemanticType::Decimal,

        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => SemanticType::Date,
        ColumnType::MYSQL_TYPE_TIME => SemanticType::Time,
        ColumnType::MYSQL_TYPE_DATETIME => SemanticType::NaiveDateTime,
        ColumnType::MYSQL_TYPE_TIMESTAMP => SemanticType::DateTime,

        ColumnType::MYSQL_TYPE_VARCHAR
        | ColumnType::MYSQL_TYPE_VAR_STRING
        | ColumnType::MYSQL_TYPE_STRING
        | ColumnType::MYSQL_TYPE_ENUM
        | ColumnType::MYSQL_TYPE_SET
        | ColumnType::MYSQL_TYPE_TINY_BLOB
        | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
        | ColumnType::MYSQL_TYPE_LONG_BLOB
        | ColumnType::MYSQL_TYPE_BLOB => SemanticType::Binary,

        ColumnType::MYSQL_TYPE_JSON => SemanticType::Json,
        ColumnType::MYSQL_TYPE_BIT => SemanticType::Bit(col.length),
        ColumnType::MYSQL_TYPE_GEOMETRY => SemanticType::Geometry,
        ColumnType::MYSQL_TYPE_NULL => SemanticType::Null,
    }
}
