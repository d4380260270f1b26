use std::time::Duration;

use serde::Deserialize;

/// What a broker does when its queue is full and no callback is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Fail the publish with `QueueFull`.
    #[default]
    Reject,
    /// Discard the new message and log a warning.
    Drop,
}

#[derive(Debug, Clone)]
pub struct BrokerOptions {
    /// Queue size for messages published while no callback is attached.
    /// `0` disables queuing: publishing then requires a callback.
    pub capacity: usize,
    /// Fixed latency slept before each delivery.
    pub publish_delay: Duration,
    pub overflow: OverflowPolicy,
}

pub const DEFAULT_CAPACITY: usize = 1024;

impl Default for BrokerOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            publish_delay: Duration::ZERO,
            overflow: OverflowPolicy::default(),
        }
    }
}
