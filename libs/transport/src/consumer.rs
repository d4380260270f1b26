use std::sync::Arc;

use transport_api::{
    ModelKey, TransportError, TransportPackage, WireMessage, CODEC_ID_HEADER, MODEL_KEY_HEADER,
};

use crate::registry::CodecRegistry;

/// Reverse of [`TransportProducer`](crate::TransportProducer):
/// wire message → logical package, resolved through the same registry.
pub struct TransportConsumer {
    codecs: Arc<CodecRegistry>,
}

impl TransportConsumer {
    pub fn new(codecs: Arc<CodecRegistry>) -> Self {
        Self { codecs }
    }

    /// Decode a wire message. The returned package carries the message.
    ///
    /// - no model header: raw package keyed as `Vec<u8>`
    /// - model header, no codec header: raw package for that model
    /// - both headers: value deserialized by the registered codec, whose id
    ///   must match the header
    pub fn decode(&self, message: &WireMessage) -> Result<TransportPackage, TransportError> {
        let key = message.key_str();
        let Some(model) = message.header_str(MODEL_KEY_HEADER).map(ModelKey::new) else {
            return Ok(
                TransportPackage::raw(ModelKey::of::<Vec<u8>>(), key, message.value().to_vec())
                    .with_wire(message.clone()),
            );
        };

        let package = match message.header_str(CODEC_ID_HEADER) {
            None => TransportPackage::raw(model, key, message.value().to_vec()),
            Some(codec_id) => {
                let codec = self.codecs.resolve(&model)?;
                if codec.id() != codec_id {
                    return Err(TransportError::CodecMismatch {
                        expected: codec.id().to_string(),
                        found: codec_id.to_string(),
                    });
                }
                let value = codec
                    .deserialize(message.value())
                    .map_err(|e| e.with_context(format!("model '{model}'")))?;
                TransportPackage::from_value(model, key, value)
            }
        };

        Ok(package.with_wire(message.clone()))
    }
}
