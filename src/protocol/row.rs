use crate::error::{Error, Result};
use crate::protocol::primitive::read_string_fix;
use crate::protocol::value::NullBitmap;

/// Header byte of every binary protocol row packet
pub const BINARY_ROW_HEADER: u8 = 0x00;

/// The payload part of a binary protocol row packet.
#[derive(Debug, Clone)]
pub struct BinaryRowPayload<'a> {
    pub(crate) null_bitmap: NullBitmap<'a>,
    pub(crate) values: &'a [u8],
    pub(crate) num_columns: usize,
}

impl<'a> BinaryRowPayload<'a> {
    /// Split a row packet into its NULL bitmap and value stream
    pub fn parse(payload: &'a [u8], num_columns: usize) -> Result<Self> {
        let (header, rest) = payload
            .split_first()
            .ok_or_else(|| Error::row("empty binary row packet"))?;
        if *header != BINARY_ROW_HEADER {
            return Err(Error::row(format!(
                "binary row header 0x{:02X}, expected 0x{:02X}",
                header, BINARY_ROW_HEADER
            )));
        }
        let (bitmap, values) = read_string_fix(rest, NullBitmap::result_set_len(num_columns))?;
        Ok(Self {
            null_bitmap: NullBitmap::for_result_set(bitmap),
            values,
            num_columns,
        })
    }

    pub fn null_bitmap(&self) -> NullBitmap<'a> {
        self.null_bitmap
    }

    pub fn values(&self) -> &'a [u8] {
        self.values
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }
}

/// The payload part of a text protocol row packet.
#[derive(Debug, Clone, Copy)]
pub struct TextRowPayload<'a>(pub &'a [u8]);
