//! Helpers for asserting on wire-level output of the transport layer.
//!
//! [`ModelFactory`] pushes a logical package through the real
//! [`TransportProducer`] into a private mock broker and hands back the
//! message the broker received.

use std::sync::Arc;

use codec_json::JsonCodec;
use mock_broker::{BrokerOptions, MockBroker};
use serde::Serialize;
use transport::{CodecRegistry, TransportProducer};
use transport_api::{TransportError, TransportPackage, WireMessage};

const FACTORY_TOPIC: &str = "model-factory";

/// Timestamp on every factory message, so equal inputs give equal messages.
pub const FACTORY_TIMESTAMP_MS: i64 = 0;

fn factory_clock() -> i64 {
    FACTORY_TIMESTAMP_MS
}

/// Builds wire messages from logical packages.
///
/// Every call registers the default JSON codec for the package's model key,
/// replacing whatever was registered for it. Not meant for concurrent use:
/// all calls share one broker queue.
pub struct ModelFactory {
    codecs: Arc<CodecRegistry>,
    broker: Arc<MockBroker>,
}

impl ModelFactory {
    pub fn new(codecs: Arc<CodecRegistry>) -> Self {
        Self {
            codecs,
            broker: MockBroker::shared(FACTORY_TOPIC, BrokerOptions::default()),
        }
    }

    pub fn codecs(&self) -> &Arc<CodecRegistry> {
        &self.codecs
    }

    /// Wire message for `value` published under `key`.
    pub fn create_wire_message<T: Serialize>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<WireMessage, TransportError> {
        let package = TransportPackage::new(Some(key), value)?;
        self.create_wire_message_from(&package)
    }

    /// Wire message for an already built package.
    pub fn create_wire_message_from(
        &self,
        package: &TransportPackage,
    ) -> Result<WireMessage, TransportError> {
        self.codecs
            .register(package.model_key().clone(), JsonCodec::shared());

        // Leftovers from a failed earlier call must not be mistaken for this one.
        let stale = self.broker.drain();
        if !stale.is_empty() {
            tracing::warn!(count = stale.len(), "discarding stale factory messages");
        }

        let producer = TransportProducer::new(self.codecs.clone(), self.broker.clone())
            .with_clock(factory_clock);
        producer.publish(package)?;
        self.broker.receive().ok_or(TransportError::NothingPublished)
    }

    /// The package as a consumer would see it: same model, key and value,
    /// plus the wire message it travelled as.
    pub fn round_trip(&self, package: TransportPackage) -> Result<TransportPackage, TransportError> {
        let wire = self.create_wire_message_from(&package)?;
        Ok(package.with_wire(wire))
    }
}
