use std::sync::Arc;

use transport_api::{Codec, TransportError};

/// Default codec: compact `serde_json` encoding of the value.
pub struct JsonCodec;

impl JsonCodec {
    pub const ID: &'static str = "json";

    pub fn shared() -> Arc<dyn Codec> {
        Arc::new(JsonCodec)
    }
}

impl Codec for JsonCodec {
    fn id(&self) -> &str {
        Self::ID
    }

    fn serialize(&self, value: &serde_json::Value) -> Result<Vec<u8>, TransportError> {
        serde_json::to_vec(value).map_err(|e| TransportError::from(e).with_context("json encode"))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<serde_json::Value, TransportError> {
        serde_json::from_slice(bytes).map_err(|e| TransportError::from(e).with_context("json decode"))
    }
}
