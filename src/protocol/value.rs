/// MySQL Binary Protocol temporal layouts and the NULL bitmap
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Error, Result};

// ============================================================================
// Temporal Types
// ============================================================================

/// TIMESTAMP - 4 bytes (DATE/DATETIME/TIMESTAMP with date only)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Timestamp4 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
}

impl Timestamp4 {
    pub fn year(&self) -> u16 {
        self.year.get()
    }

    pub fn is_zero(&self) -> bool {
        self.year() == 0 && self.month == 0 && self.day == 0
    }

    pub fn to_date(&self) -> Result<NaiveDate> {
        date(self.year(), self.month, self.day)
    }
}

impl From<NaiveDate> for Timestamp4 {
    fn from(d: NaiveDate) -> Self {
        Self {
            year: U16LE::new(d.year() as u16),
            month: d.month() as u8,
            day: d.day() as u8,
        }
    }
}

/// TIMESTAMP - 7 bytes (DATE/DATETIME/TIMESTAMP without microseconds)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Timestamp7 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Timestamp7 {
    pub fn year(&self) -> u16 {
        self.year.get()
    }

    pub fn is_zero(&self) -> bool {
        self.year() == 0 && self.month == 0 && self.day == 0
    }

    pub fn to_datetime(&self) -> Result<NaiveDateTime> {
        let time = hms_micro(self.hour, self.minute, self.second, 0)?;
        Ok(date(self.year(), self.month, self.day)?.and_time(time))
    }
}

impl From<NaiveDateTime> for Timestamp7 {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            year: U16LE::new(dt.year() as u16),
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
        }
    }
}

/// TIMESTAMP - 11 bytes (DATE/DATETIME/TIMESTAMP with microseconds)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Timestamp11 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: U32LE,
}

impl Timestamp11 {
    pub fn year(&self) -> u16 {
        self.year.get()
    }

    pub fn microsecond(&self) -> u32 {
        self.microsecond.get()
    }

    pub fn is_zero(&self) -> bool {
        self.year() == 0 && self.month == 0 && self.day == 0
    }

    pub fn to_datetime(&self) -> Result<NaiveDateTime> {
        let time = hms_micro(self.hour, self.minute, self.second, self.microsecond())?;
        Ok(date(self.year(), self.month, self.day)?.and_time(time))
    }
}

impl From<NaiveDateTime> for Timestamp11 {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            year: U16LE::new(dt.year() as u16),
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
            microsecond: U32LE::new(microsecond_of(dt.time())),
        }
    }
}

/// TIME - 8 bytes
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Time8 {
    pub is_negative: u8,
    pub days: U32LE,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Time8 {
    pub fn is_negative(&self) -> bool {
        self.is_negative != 0
    }

    pub fn days(&self) -> u32 {
        self.days.get()
    }

    /// Time of day. Negative and multi-day values are rejected.
    pub fn to_time(&self) -> Result<NaiveTime> {
        check_time_range(self.is_negative(), self.days(), self.hour)?;
        hms_micro(self.hour, self.minute, self.second, 0)
    }
}

impl From<NaiveTime> for Time8 {
    fn from(t: NaiveTime) -> Self {
        Self {
            is_negative: 0,
            days: U32LE::new(0),
            hour: t.hour() as u8,
            minute: t.minute() as u8,
            second: t.second() as u8,
        }
    }
}

/// TIME - 12 bytes: is_negative (1), days (4 LE), hour (1), minute (1), second (1), microsecond (4 LE)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Time12 {
    pub is_negative: u8,
    pub days: U32LE,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: U32LE,
}

impl Time12 {
    pub fn is_negative(&self) -> bool {
        self.is_negative != 0
    }

    pub fn days(&self) -> u32 {
        self.days.get()
    }

    pub fn microsecond(&self) -> u32 {
        self.microsecond.get()
    }

    /// Time of day. Negative and multi-day values are rejected.
    pub fn to_time(&self) -> Result<NaiveTime> {
        check_time_range(self.is_negative(), self.days(), self.hour)?;
        hms_micro(self.hour, self.minute, self.second, self.microsecond())
    }
}

impl From<NaiveTime> for Time12 {
    fn from(t: NaiveTime) -> Self {
        Self {
            is_negative: 0,
            days: U32LE::new(0),
            hour: t.hour() as u8,
            minute: t.minute() as u8,
            second: t.second() as u8,
            microsecond: U32LE::new(microsecond_of(t)),
        }
    }
}

/// Microseconds of a time value. A leap second (nanosecond >= 1e9) folds into the last one.
pub(crate) fn microsecond_of(t: NaiveTime) -> u32 {
    (t.nanosecond() / 1_000).min(999_999)
}

fn check_time_range(is_negative: bool, days: u32, hour: u8) -> Result<()> {
    if is_negative {
        return Err(Error::UnsupportedTimeRange(format!(
            "negative time (-{} days {} hours)",
            days, hour
        )));
    }
    if days != 0 || hour >= 24 {
        return Err(Error::UnsupportedTimeRange(format!(
            "time of {} days {} hours exceeds one day",
            days, hour
        )));
    }
    Ok(())
}

fn date(year: u16, month: u8, day: u8) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day)).ok_or_else(|| {
        Error::row(format!(
            "invalid calendar date {:04}-{:02}-{:02}",
            year, month, day
        ))
    })
}

fn hms_micro(hour: u8, minute: u8, second: u8, micro: u32) -> Result<NaiveTime> {
    NaiveTime::from_hms_micro_opt(
        u32::from(hour),
        u32::from(minute),
        u32::from(second),
        micro,
    )
    .ok_or_else(|| {
        Error::row(format!(
            "invalid time of day {:02}:{:02}:{:02}.{:06}",
            hour, minute, second, micro
        ))
    })
}

// ============================================================================
// NULL Bitmap
// ============================================================================

/// NULL bitmap for binary protocol
///
/// In MySQL binary protocol, NULL values are indicated by a bitmap where each bit
/// represents whether a column is NULL (1 = NULL, 0 = not NULL).
///
/// For result sets (COM_STMT_EXECUTE response), the bitmap has an offset of 2 bits.
/// For prepared statement parameters, the offset is 0 bits.
#[derive(Debug, Clone, Copy)]
pub struct NullBitmap<'a> {
    bitmap: &'a [u8],
    offset: usize,
}

impl<'a> NullBitmap<'a> {
    /// Bitmap length in bytes for a result set row of `num_columns` columns
    pub fn result_set_len(num_columns: usize) -> usize {
        (num_columns + 7 + 2) / 8
    }

    /// Bitmap length in bytes for `num_params` statement parameters
    pub fn parameters_len(num_params: usize) -> usize {
        num_params.div_ceil(8)
    }

    /// Create a NULL bitmap for result sets (offset = 2)
    pub fn for_result_set(bitmap: &'a [u8]) -> Self {
        Self { bitmap, offset: 2 }
    }

    /// Create a NULL bitmap for parameters (offset = 0)
    pub fn for_parameters(bitmap: &'a [u8]) -> Self {
        Self { bitmap, offset: 0 }
    }

    /// Check if the column at the given index is NULL
    ///
    /// # Arguments
    /// * `idx` - Column index (0-based)
    ///
    /// # Returns
    /// `true` if the column is NULL, `false` otherwise
    pub fn is_null(&self, idx: usize) -> bool {
        let bit_pos = idx + self.offset;
        let byte_pos = bit_pos >> 3;
        let bit_offset = bit_pos & 7;

        if byte_pos >= self.bitmap.len() {
            return false;
        }

        (self.bitmap[byte_pos] & (1 << bit_offset)) != 0
    }

    /// Get the raw bitmap bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bitmap
    }
}

/// Mark parameter `idx` as NULL in a parameter bitmap (offset 0)
pub fn set_param_null(bitmap: &mut [u8], idx: usize) {
    if let Some(byte) = bitmap.get_mut(idx >> 3) {
        *byte |= 1 << (idx & 7);
    }
}
