pub mod col;
mod codec;
mod opts;
pub mod constant;
pub mod error;
pub mod geometry;
pub mod json;
pub mod protocol;
pub mod raw;
pub mod text;
pub mod value;

pub use codec::RowCodec;
pub use col::{ColumnDescriptor, SemanticType};
pub use constant::{ColumnType, code_to_tag, tag_to_code};
pub use error::{Error, Result};
pub use geometry::Geometry;
pub use json::{JsonCodec, SerdeJson};
pub use opts::Opts;
pub use protocol::EncodedParams;
pub use value::{BitString, Decimal, Value};

#[cfg(test)]
mod text_test;
