use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use codec_json::JsonCodec;
use mock_broker::{BrokerOptions, OverflowPolicy};
use transport_api::{Codec, TransportError};

/// Codec the client falls back to for models nobody registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultCodec {
    Json,
}

impl DefaultCodec {
    pub fn codec(self) -> Arc<dyn Codec> {
        match self {
            DefaultCodec::Json => JsonCodec::shared(),
        }
    }
}

/// Harness configuration — parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Topic used by the default-topic producer/consumer getters.
    #[serde(default = "default_topic")]
    pub default_topic: String,

    /// Latency slept before every delivery, in milliseconds.
    #[serde(default)]
    pub publish_delay_ms: u64,

    /// Per-topic queue for messages published before a consumer attaches.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default)]
    pub overflow: OverflowPolicy,

    /// Unset: publishing an unregistered model fails with `CodecNotFound`.
    #[serde(default)]
    pub default_codec: Option<DefaultCodec>,
}

fn default_topic() -> String {
    "DEFAULT".into()
}

fn default_queue_capacity() -> usize {
    mock_broker::options::DEFAULT_CAPACITY
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            default_topic: default_topic(),
            publish_delay_ms: 0,
            queue_capacity: default_queue_capacity(),
            overflow: OverflowPolicy::default(),
            default_codec: None,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, TransportError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TransportError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, TransportError> {
        toml::from_str(toml_str).map_err(|e| TransportError::Config(e.to_string()))
    }

    pub fn publish_delay(&self) -> Duration {
        Duration::from_millis(self.publish_delay_ms)
    }

    pub fn broker_options(&self) -> BrokerOptions {
        BrokerOptions {
            capacity: self.queue_capacity,
            publish_delay: self.publish_delay(),
            overflow: self.overflow,
        }
    }
}
