use std::sync::Arc;

use transport_api::{
    now_ms, MessageHeader, MessagePublisher, PackageValue, TransportError, TransportPackage,
    WireMessage, CODEC_ID_HEADER, MODEL_KEY_HEADER,
};

use crate::registry::CodecRegistry;

/// Source of the timestamp stamped on each wire message, in milliseconds.
pub type Clock = fn() -> i64;

/// Turns logical packages into wire messages and hands them to a publisher.
pub struct TransportProducer {
    codecs: Arc<CodecRegistry>,
    publisher: Arc<dyn MessagePublisher>,
    clock: Clock,
}

impl TransportProducer {
    pub fn new(codecs: Arc<CodecRegistry>, publisher: Arc<dyn MessagePublisher>) -> Self {
        Self {
            codecs,
            publisher,
            clock: now_ms,
        }
    }

    /// Replace the wall clock, e.g. with a constant for reproducible output.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Serialize and forward. Nothing reaches the publisher if encoding fails.
    pub fn publish(&self, package: &TransportPackage) -> Result<(), TransportError> {
        let message = self.encode(package)?;
        tracing::debug!(
            model = %package.model_key(),
            key = package.key().unwrap_or(""),
            bytes = message.value().len(),
            "publishing package"
        );
        self.publisher.publish(message)
    }

    /// Build the wire message for a package without publishing it.
    ///
    /// Typed values go through the codec registered for the model key;
    /// raw payloads are copied verbatim and skip the registry.
    pub fn encode(&self, package: &TransportPackage) -> Result<WireMessage, TransportError> {
        let mut headers = vec![MessageHeader {
            name: MODEL_KEY_HEADER.to_string(),
            value: package.model_key().as_str().as_bytes().to_vec(),
        }];

        let value = match package.value() {
            PackageValue::Raw(bytes) => bytes.clone(),
            PackageValue::Typed(value) => {
                let codec = self.codecs.resolve(package.model_key())?;
                let bytes = codec
                    .serialize(value)
                    .map_err(|e| e.with_context(format!("model '{}'", package.model_key())))?;
                headers.push(MessageHeader {
                    name: CODEC_ID_HEADER.to_string(),
                    value: codec.id().as_bytes().to_vec(),
                });
                bytes
            }
        };

        Ok(WireMessage::new(
            package.key().map(|k| k.as_bytes().to_vec()),
            value,
            headers,
            (self.clock)(),
        ))
    }
}
