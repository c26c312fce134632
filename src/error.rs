use thiserror::Error;

pub use color_eyre::eyre::eyre;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown column type code: 0x{0:02X}")]
    UnknownTypeCode(u8),

    #[error("Row column count mismatch: {expected} columns declared, {actual} found")]
    RowColumnCountMismatch { expected: usize, actual: usize },

    #[error("Row decode error: {0}")]
    RowDecodeError(String),

    #[error("Malformed integer literal: {0:?}")]
    MalformedIntegerLiteral(String),

    #[error("Malformed float literal: {0:?}")]
    MalformedFloatLiteral(String),

    #[error("Malformed decimal literal: {0:?}")]
    MalformedDecimalLiteral(String),

    #[error("Malformed temporal literal: {0:?}")]
    MalformedTemporalLiteral(String),

    #[error("Unsupported time range: {0}")]
    UnsupportedTimeRange(String),

    #[error("Unsupported geometry encoding: {0}")]
    UnsupportedGeometryEncoding(String),

    #[error("Invalid parameter value: {0}")]
    InvalidParameterValue(String),

    #[error("Datetime parameter is not in UTC: {0}")]
    NotUTC(String),

    #[error("JSON codec error: {0}")]
    Json(String),

    #[error("Library bug: {0}")]
    LibraryBug(color_eyre::Report),
}

impl Error {
    /// Wrap a zerocopy cast failure. The caller has already checked the length,
    /// so reaching this is an internal bug.
    pub fn from_debug(err: impl std::fmt::Debug) -> Self {
        Error::LibraryBug(eyre!("{:?}", err))
    }

    /// Shorthand for a truncated or malformed binary layout.
    pub(crate) fn row(msg: impl Into<String>) -> Self {
        Error::RowDecodeError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
