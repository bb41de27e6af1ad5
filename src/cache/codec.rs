//! Value encoding strategy.
//!
//! Values are stored in the backend as text; the codec decides how typed
//! values become text and back.

use serde::{de::DeserializeOwned, Serialize};

/// Serialization strategy used by the coordinator.
pub trait Codec: Send + Sync + 'static {
    /// Encodes a value for storage.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, String>;

    /// Decodes a stored value.
    fn decode<T: DeserializeOwned>(&self, raw: &str) -> Result<T, String>;
}

/// JSON encoding via serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, String> {
        serde_json::to_string(value).map_err(|e| e.to_string())
    }

    fn decode<T: DeserializeOwned>(&self, raw: &str) -> Result<T, String> {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    }
}
