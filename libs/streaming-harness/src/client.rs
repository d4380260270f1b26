use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use mock_broker::MockBroker;
use transport::{CodecRegistry, TransportConsumer, TransportProducer};
use transport_api::TransportError;

use crate::config::HarnessConfig;
use crate::topic::{
    BrokerTopicConsumer, BrokerTopicProducer, RawTopicConsumer, RawTopicProducer, TopicConsumer,
    TopicProducer,
};

// ═══════════════════════════════════════════════════════════════
//  Consumer options
// ═══════════════════════════════════════════════════════════════

/// Where a new consumer starts reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OffsetStart {
    #[default]
    Latest,
    Earliest,
    /// Last committed offset of the consumer group.
    Stored,
    At(i64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitMode {
    #[default]
    Auto,
    Manual,
}

/// Consumer settings of the production client.
///
/// The mock broker has a single partition and no offsets, so these are
/// accepted and logged only.
#[derive(Debug, Clone, Default)]
pub struct ConsumerOptions {
    pub consumer_group: Option<String>,
    pub offset: OffsetStart,
    pub commit: CommitMode,
}

impl ConsumerOptions {
    pub fn group(name: impl Into<String>) -> Self {
        Self { consumer_group: Some(name.into()), ..Default::default() }
    }

    pub fn with_offset(mut self, offset: OffsetStart) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_commit(mut self, commit: CommitMode) -> Self {
        self.commit = commit;
        self
    }
}

// ═══════════════════════════════════════════════════════════════
//  StreamingClient
// ═══════════════════════════════════════════════════════════════

/// Client surface shared by the production client and the test double.
pub trait StreamingClient {
    /// Topic used by the default-topic getters.
    fn default_topic(&self) -> &str;

    fn get_topic_consumer(
        &self,
        topic: &str,
        options: &ConsumerOptions,
    ) -> Result<Box<dyn TopicConsumer>, TransportError>;

    fn get_topic_producer(&self, topic: &str) -> Result<Box<dyn TopicProducer>, TransportError>;

    fn get_raw_topic_consumer(
        &self,
        topic: &str,
        options: &ConsumerOptions,
    ) -> Result<Box<dyn RawTopicConsumer>, TransportError>;

    fn get_raw_topic_producer(&self, topic: &str) -> Result<Box<dyn RawTopicProducer>, TransportError>;

    fn get_default_topic_consumer(&self) -> Result<Box<dyn TopicConsumer>, TransportError> {
        self.get_topic_consumer(self.default_topic(), &ConsumerOptions::default())
    }

    fn get_default_topic_producer(&self) -> Result<Box<dyn TopicProducer>, TransportError> {
        self.get_topic_producer(self.default_topic())
    }
}

// ═══════════════════════════════════════════════════════════════
//  TestStreamingClient
// ═══════════════════════════════════════════════════════════════

/// In-memory [`StreamingClient`]: one mock broker per topic name.
///
/// Brokers are created on first use of a topic and reused afterwards.
pub struct TestStreamingClient {
    codecs: Arc<CodecRegistry>,
    decoder: Arc<TransportConsumer>,
    config: HarnessConfig,
    brokers: RwLock<HashMap<String, Arc<MockBroker>>>,
}

impl std::fmt::Debug for TestStreamingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestStreamingClient")
            .field("config", &self.config)
            .field("topics", &self.topics())
            .finish()
    }
}

impl TestStreamingClient {
    pub fn new(codecs: Arc<CodecRegistry>) -> Self {
        Self::with_config(codecs, HarnessConfig::default())
    }

    /// A configured `default_codec` becomes the registry's fallback codec.
    pub fn with_config(codecs: Arc<CodecRegistry>, config: HarnessConfig) -> Self {
        if let Some(default_codec) = config.default_codec {
            codecs.set_fallback(default_codec.codec());
        }
        Self {
            decoder: Arc::new(TransportConsumer::new(codecs.clone())),
            codecs,
            config,
            brokers: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config_file(codecs: Arc<CodecRegistry>, path: &str) -> Result<Self, TransportError> {
        Ok(Self::with_config(codecs, HarnessConfig::load(path)?))
    }

    pub fn codecs(&self) -> &Arc<CodecRegistry> {
        &self.codecs
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Consumer bound to `topic`'s broker.
    pub fn topic_consumer(&self, topic: &str, options: &ConsumerOptions) -> BrokerTopicConsumer {
        if options.consumer_group.is_some()
            || options.offset != OffsetStart::default()
            || options.commit != CommitMode::default()
        {
            tracing::debug!(
                topic = %topic,
                group = ?options.consumer_group,
                offset = ?options.offset,
                commit = ?options.commit,
                "consumer options have no effect on the mock broker"
            );
        }
        BrokerTopicConsumer::new(
            self.broker(topic),
            self.decoder.clone(),
            options.consumer_group.clone(),
        )
    }

    /// Producer bound to `topic`'s broker.
    pub fn topic_producer(&self, topic: &str) -> BrokerTopicProducer {
        let broker = self.broker(topic);
        let producer = TransportProducer::new(self.codecs.clone(), broker.clone());
        BrokerTopicProducer::new(broker, producer)
    }

    /// The broker behind `topic`, created on first request.
    pub fn broker(&self, topic: &str) -> Arc<MockBroker> {
        if let Some(broker) = self.read_brokers().get(topic) {
            return broker.clone();
        }

        let mut brokers = match self.brokers.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("broker map write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        brokers
            .entry(topic.to_string())
            .or_insert_with(|| {
                tracing::info!(topic = %topic, "creating topic broker");
                MockBroker::shared(topic, self.config.broker_options())
            })
            .clone()
    }

    /// Topics that have a broker, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_brokers().keys().cloned().collect();
        names.sort();
        names
    }

    fn read_brokers(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<MockBroker>>> {
        match self.brokers.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("broker map read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl StreamingClient for TestStreamingClient {
    fn default_topic(&self) -> &str {
        &self.config.default_topic
    }

    fn get_topic_consumer(
        &self,
        topic: &str,
        options: &ConsumerOptions,
    ) -> Result<Box<dyn TopicConsumer>, TransportError> {
        Ok(Box::new(self.topic_consumer(topic, options)))
    }

    fn get_topic_producer(&self, topic: &str) -> Result<Box<dyn TopicProducer>, TransportError> {
        Ok(Box::new(self.topic_producer(topic)))
    }

    fn get_raw_topic_consumer(
        &self,
        _topic: &str,
        _options: &ConsumerOptions,
    ) -> Result<Box<dyn RawTopicConsumer>, TransportError> {
        Err(TransportError::NotImplemented("raw topic consumer"))
    }

    fn get_raw_topic_producer(&self, _topic: &str) -> Result<Box<dyn RawTopicProducer>, TransportError> {
        Err(TransportError::NotImplemented("raw topic producer"))
    }
}
