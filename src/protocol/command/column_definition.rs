use crate::col::ColumnDescriptor;
use crate::constant::{ColumnFlags, ColumnType};
use crate::error::{Error, Result};
use crate::protocol::primitive::*;
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// Length of the fixed-size fields at the end of a column definition packet
const TAIL_LEN: usize = 12;

/// Represents a payload part of a column definition packet
#[derive(Debug, Clone, Copy)]
pub struct ColumnDefinitionBytes<'a>(pub &'a [u8]);

impl<'a> ColumnDefinitionBytes<'a> {
    /// Get a reference to the fixed-size tail of the column definition
    ///
    /// The tail is always the last 12 bytes of the column definition packet
    pub fn tail(&self) -> Result<&'a ColumnDefinitionTail> {
        let start = self.0.len().checked_sub(TAIL_LEN).ok_or_else(|| {
            Error::row(format!(
                "column definition too short: {} < {}",
                self.0.len(),
                TAIL_LEN
            ))
        })?;
        ColumnDefinitionTail::ref_from_bytes(&self.0[start..]).map_err(Error::from_debug)
    }
}

/// The column definition parsed from `ColumnDefinitionBytes`
#[derive(Debug, Clone)]
pub struct ColumnDefinition<'a> {
    pub schema: &'a [u8],
    pub table_alias: &'a [u8],
    pub table_original: &'a [u8],
    pub name_alias: &'a [u8],
    pub name_original: &'a [u8],
    pub tail: &'a ColumnDefinitionTail,
}

impl ColumnDefinition<'_> {
    /// The metadata the row decoders need from this column
    pub fn descriptor(&self) -> Result<ColumnDescriptor> {
        self.tail.descriptor()
    }
}

impl<'a> TryFrom<ColumnDefinitionBytes<'a>> for ColumnDefinition<'a> {
    type Error = Error;

    fn try_from(bytes: ColumnDefinitionBytes<'a>) -> Result<Self> {
        let data = bytes.0;

        // ─── Variable Length String Fields ───────────────────────────
        let (_catalog, data) = read_string_lenenc(data)?;
        let (schema, data) = read_string_lenenc(data)?;
        let (table_alias, data) = read_string_lenenc(data)?;
        let (table_original, data) = read_string_lenenc(data)?;
        let (name_alias, data) = read_string_lenenc(data)?;
        let (name_original, data) = read_string_lenenc(data)?;

        // ─── Fixed Length Fields ─────────────────────────────────────
        // length is always 0x0c; anything after the tail (default values
        // of COM_FIELD_LIST) is ignored
        let (length, data) = read_int_lenenc(data)?;
        if length != TAIL_LEN as u64 {
            return Err(Error::row(format!(
                "column definition fixed fields length {}, expected {}",
                length, TAIL_LEN
            )));
        }
        let (tail, _rest) = read_string_fix(data, TAIL_LEN)?;
        let tail = ColumnDefinitionTail::ref_from_bytes(tail).map_err(Error::from_debug)?;
        Ok(Self {
            schema,
            table_alias,
            table_original,
            name_alias,
            name_original,
            tail,
        })
    }
}

impl<'a> TryFrom<&'a [u8]> for ColumnDefinition<'a> {
    type Error = Error;

    fn try_from(payload: &'a [u8]) -> Result<Self> {
        Self::try_from(ColumnDefinitionBytes(payload))
    }
}

/// Fixed-size tail of Column Definition packet (12 bytes)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct ColumnDefinitionTail {
    charset: U16LE,
    column_length: U32LE,
    column_type: u8,
    flags: U16LE,
    decimals: u8,
    reserved: U16LE,
}

impl ColumnDefinitionTail {
    pub fn charset(&self) -> u16 {
        self.charset.get()
    }

    pub fn column_length(&self) -> u32 {
        self.column_length.get()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn column_type(&self) -> Result<ColumnType> {
        ColumnType::try_from(self.column_type)
    }

    /// Flags the server sets but this crate has no name for are dropped
    pub fn flags(&self) -> ColumnFlags {
        ColumnFlags::from_bits_truncate(self.flags.get())
    }

    pub fn descriptor(&self) -> Result<ColumnDescriptor> {
        ColumnDescriptor::from_raw(self.column_type, self.flags.get(), self.column_length())
    }
}
