//! Simulated streaming client for producer/consumer tests.
//!
//! [`TestStreamingClient`] implements [`StreamingClient`] by backing each
//! topic with its own in-memory [`MockBroker`](mock_broker::MockBroker).
//! Handles obtained for the same topic name share that broker, so a test
//! can publish through a producer and read the decoded packages from a
//! consumer without any network.

pub mod client;
pub mod config;
pub mod topic;

pub use client::{CommitMode, ConsumerOptions, OffsetStart, StreamingClient, TestStreamingClient};
pub use config::{DefaultCodec, HarnessConfig};
pub use topic::{
    BrokerTopicConsumer, BrokerTopicProducer, PackageHandler, RawTopicConsumer, RawTopicProducer,
    TopicConsumer, TopicProducer,
};
