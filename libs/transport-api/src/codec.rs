use crate::error::TransportError;
use crate::message::WireMessage;

/// Value codec — performs `serde_json::Value ↔ bytes` for one model type.
///
/// Codecs are resolved by `ModelKey` from a codec registry. The transport
/// layer never interprets the produced bytes.
pub trait Codec: Send + Sync {
    /// Stable identifier written into the `x-codec-id` header.
    fn id(&self) -> &str;

    fn serialize(&self, value: &serde_json::Value) -> Result<Vec<u8>, TransportError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<serde_json::Value, TransportError>;
}

/// Destination of finished wire messages (a broker connection, or a mock).
pub trait MessagePublisher: Send + Sync {
    fn publish(&self, message: WireMessage) -> Result<(), TransportError>;
}
