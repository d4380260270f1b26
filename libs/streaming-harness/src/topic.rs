use std::sync::Arc;

use serde::Serialize;

use mock_broker::MockBroker;
use transport::{TransportConsumer, TransportProducer};
use transport_api::{TransportError, TransportPackage, WireMessage};

/// Subscriber hook for decoded packages.
pub type PackageHandler = Box<dyn Fn(TransportPackage) + Send + Sync>;

// ═══════════════════════════════════════════════════════════════
//  Topic handle traits
// ═══════════════════════════════════════════════════════════════

/// Publishes logical packages to one topic.
pub trait TopicProducer: Send + Sync {
    fn topic(&self) -> &str;

    fn publish(&self, package: &TransportPackage) -> Result<(), TransportError>;
}

/// Reads decoded packages from one topic.
pub trait TopicConsumer: Send + Sync {
    fn topic(&self) -> &str;

    /// Next package, `None` when nothing is waiting.
    fn receive(&self) -> Result<Option<TransportPackage>, TransportError>;

    /// Everything waiting, in publish order.
    fn receive_all(&self) -> Result<Vec<TransportPackage>, TransportError> {
        let mut out = Vec::new();
        while let Some(package) = self.receive()? {
            out.push(package);
        }
        Ok(out)
    }

    /// Push delivery instead of polling. Replaces any handler attached to
    /// the same topic; packages already waiting are delivered first.
    fn on_package_received(&self, handler: PackageHandler) -> Result<(), TransportError>;
}

/// Publishes pre-built wire messages, skipping the codec layer.
pub trait RawTopicProducer: Send + Sync {
    fn topic(&self) -> &str;

    fn publish_raw(&self, message: WireMessage) -> Result<(), TransportError>;
}

/// Reads wire messages without decoding them.
pub trait RawTopicConsumer: Send + Sync {
    fn topic(&self) -> &str;

    fn receive_raw(&self) -> Result<Option<WireMessage>, TransportError>;
}

// ═══════════════════════════════════════════════════════════════
//  Broker-backed implementations
// ═══════════════════════════════════════════════════════════════

pub struct BrokerTopicProducer {
    topic: String,
    producer: TransportProducer,
}

impl BrokerTopicProducer {
    pub(crate) fn new(broker: Arc<MockBroker>, producer: TransportProducer) -> Self {
        Self { topic: broker.topic().to_string(), producer }
    }

    /// Package and publish a typed value.
    pub fn publish_value<T: Serialize>(&self, key: Option<&str>, value: &T) -> Result<(), TransportError> {
        self.publish(&TransportPackage::new(key, value)?)
    }
}

impl TopicProducer for BrokerTopicProducer {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&self, package: &TransportPackage) -> Result<(), TransportError> {
        self.producer.publish(package)
    }
}

pub struct BrokerTopicConsumer {
    broker: Arc<MockBroker>,
    decoder: Arc<TransportConsumer>,
    consumer_group: Option<String>,
}

impl BrokerTopicConsumer {
    pub(crate) fn new(
        broker: Arc<MockBroker>,
        decoder: Arc<TransportConsumer>,
        consumer_group: Option<String>,
    ) -> Self {
        Self { broker, decoder, consumer_group }
    }

    pub fn consumer_group(&self) -> Option<&str> {
        self.consumer_group.as_deref()
    }

    /// Number of wire messages waiting for this topic.
    pub fn pending(&self) -> usize {
        self.broker.pending()
    }
}

impl TopicConsumer for BrokerTopicConsumer {
    fn topic(&self) -> &str {
        self.broker.topic()
    }

    fn receive(&self) -> Result<Option<TransportPackage>, TransportError> {
        self.broker
            .receive()
            .map(|message| self.decoder.decode(&message))
            .transpose()
    }

    fn on_package_received(&self, handler: PackageHandler) -> Result<(), TransportError> {
        let decoder = self.decoder.clone();
        self.broker.set_callback(move |message| {
            handler(decoder.decode(&message)?);
            Ok(())
        })
    }
}
