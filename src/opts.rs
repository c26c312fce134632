use std::sync::Arc;

use smart_default::SmartDefault;

use crate::json::{JsonCodec, SerdeJson};

/// Codec configuration
///
/// ```rs
/// let mut opts = Opts::default();
/// opts.json = Arc::new(MyJsonCodec);
/// let codec = RowCodec::new(opts);
/// ```
#[derive(Debug, Clone, SmartDefault)]
pub struct Opts {
    /// JSON codec for JSON columns and structured parameters
    #[default(Arc::new(SerdeJson))]
    pub json: Arc<dyn JsonCodec>,

    /// Require BIT payloads to carry exactly `8 - (M mod 8)` pad bits.
    ///
    /// When false, the server's minimal padding is accepted as well, so a
    /// byte-aligned `BIT(8)` arriving as one byte still decodes.
    #[default(false)]
    pub strict_bit_padding: bool,
}

impl Opts {
    pub fn with_json(json: impl JsonCodec + 'static) -> Self {
        Self {
            json: Arc::new(json),
            ..Default::default()
        }
    }
}
