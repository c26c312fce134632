pub mod command;
pub mod param;
pub mod primitive;
mod row;
pub mod value;

pub use param::EncodedParams;
pub use row::{BINARY_ROW_HEADER, BinaryRowPayload, TextRowPayload};
