use auto_impl::auto_impl;

use crate::error::{Error, Result};

/// Pluggable JSON text codec used for JSON columns and structured parameters.
///
/// Implementations are shared between threads and must not hold mutable state.
#[auto_impl(&, Box, Arc)]
pub trait JsonCodec: Send + Sync + std::fmt::Debug {
    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value>;
}

/// The default codec, backed by `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJson;

impl JsonCodec for SerdeJson {
    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::Json(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value> {
        serde_json::from_slice(bytes).map_err(|e| Error::Json(e.to_string()))
    }
}
