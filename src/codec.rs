use crate::col::ColumnDescriptor;
use crate::constant::ColumnType;
use crate::error::Result;
use crate::opts::Opts;
use crate::protocol::{EncodedParams, TextRowPayload, param};
use crate::value::Value;
use crate::{raw, text};

/// Row value codec.
///
/// Holds only immutable configuration, so one instance can be cloned or
/// shared between threads and used for any number of result sets.
#[derive(Debug, Clone, Default)]
pub struct RowCodec {
    opts: Opts,
}

impl RowCodec {
    pub fn new(opts: Opts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    /// Decode one text protocol row (`COM_QUERY` result sets).
    #[tracing::instrument(skip_all, fields(columns = columns.len()))]
    pub fn decode_text_row(&self, raw: &[u8], columns: &[ColumnDescriptor]) -> Result<Vec<Value>> {
        text::decode_text_row(TextRowPayload(raw), columns, &self.opts)
    }

    /// Decode one binary protocol row (`COM_STMT_EXECUTE` result sets).
    #[tracing::instrument(skip_all, fields(columns = columns.len()))]
    pub fn decode_binary_row(
        &self,
        raw: &[u8],
        columns: &[ColumnDescriptor],
    ) -> Result<Vec<Value>> {
        raw::decode_binary_row(raw, columns, &self.opts)
    }

    /// Encode a bound parameter into its type tag and payload.
    pub fn encode_param(&self, value: &Value) -> Result<(ColumnType, Vec<u8>)> {
        param::encode_param(value, &*self.opts.json)
    }

    /// Encode a parameter list into its NULL bitmap, type block and values.
    #[tracing::instrument(skip_all, fields(params = params.len()))]
    pub fn encode_params(&self, params: &[Value]) -> Result<EncodedParams> {
        param::encode_params(params, &*self.opts.json)
    }
}
