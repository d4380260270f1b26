pub mod options;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::sync::mpsc;

use transport_api::{MessagePublisher, TransportError, WireMessage};

pub use options::{BrokerOptions, OverflowPolicy};

/// Synchronous delivery hook installed by a subscriber.
pub type DeliveryCallback = Arc<dyn Fn(WireMessage) -> Result<(), TransportError> + Send + Sync>;

// ═══════════════════════════════════════════════════════════════
//  Queue
// ═══════════════════════════════════════════════════════════════

/// Bounded FIFO holding messages published while no callback is attached.
struct Queue {
    tx: mpsc::Sender<WireMessage>,
    rx: Mutex<mpsc::Receiver<WireMessage>>,
    capacity: usize,
}

impl Queue {
    fn new(capacity: usize) -> Option<Self> {
        if capacity == 0 {
            return None;
        }
        let (tx, rx) = mpsc::channel(capacity);
        Some(Self { tx, rx: Mutex::new(rx), capacity })
    }

    fn rx(&self) -> MutexGuard<'_, mpsc::Receiver<WireMessage>> {
        match self.rx.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("broker queue lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MockBroker
// ═══════════════════════════════════════════════════════════════

/// In-memory stand-in for a single-topic, single-partition broker.
///
/// Delivery is linear and synchronous: `publish` returns once the message
/// was handed to the callback or queued. Without a callback messages wait
/// in a bounded queue until `receive()` pulls them or a callback attaches.
pub struct MockBroker {
    topic: String,
    options: BrokerOptions,
    queue: Option<Queue>,
    callback: RwLock<Option<DeliveryCallback>>,
    delivered: AtomicU64,
}

impl std::fmt::Debug for MockBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBroker")
            .field("topic", &self.topic)
            .field("options", &self.options)
            .field("pending", &self.pending())
            .finish()
    }
}

impl MockBroker {
    pub fn new(topic: impl Into<String>, options: BrokerOptions) -> Self {
        let topic = topic.into();
        tracing::debug!(
            topic = %topic,
            capacity = options.capacity,
            delay_ms = options.publish_delay.as_millis() as u64,
            "created mock broker"
        );
        Self {
            queue: Queue::new(options.capacity),
            topic,
            options,
            callback: RwLock::new(None),
            delivered: AtomicU64::new(0),
        }
    }

    pub fn shared(topic: impl Into<String>, options: BrokerOptions) -> Arc<Self> {
        Arc::new(Self::new(topic, options))
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn options(&self) -> &BrokerOptions {
        &self.options
    }

    /// Replace the delivery callback.
    ///
    /// Messages queued before the callback existed are delivered to it, in
    /// publish order, before it is installed. Publishes made meanwhile
    /// (including from the callback itself) join the back of the queue, so
    /// the callback sees every message in FIFO order.
    ///
    /// On the first callback error the callback is not installed and the
    /// remaining messages stay queued.
    pub fn set_callback<F>(&self, callback: F) -> Result<(), TransportError>
    where
        F: Fn(WireMessage) -> Result<(), TransportError> + Send + Sync + 'static,
    {
        let callback: DeliveryCallback = Arc::new(callback);
        let Some(queue) = &self.queue else {
            *self.callback_slot() = Some(callback);
            return Ok(());
        };

        // Detach first so live publishes queue up behind the backlog.
        *self.callback_slot() = None;

        let mut backlog = 0usize;
        loop {
            let message = {
                let mut rx = queue.rx();
                match rx.try_recv() {
                    Ok(message) => message,
                    Err(_) => {
                        // Installed under the queue lock: a concurrent publish
                        // either queued before this point or sees the callback.
                        *self.callback_slot() = Some(callback.clone());
                        break;
                    }
                }
            };
            backlog += 1;
            callback(message)?;
        }

        if backlog > 0 {
            tracing::debug!(topic = %self.topic, count = backlog, "delivered queued messages to new callback");
        }
        Ok(())
    }

    /// Detach the callback; later publishes are queued again.
    pub fn clear_callback(&self) {
        *self.callback_slot() = None;
    }

    pub fn has_callback(&self) -> bool {
        self.current_callback().is_some()
    }

    /// Deliver a message: optional fixed delay, then callback or queue.
    pub fn publish(&self, message: WireMessage) -> Result<(), TransportError> {
        if !self.options.publish_delay.is_zero() {
            std::thread::sleep(self.options.publish_delay);
        }

        let Some(queue) = &self.queue else {
            let Some(callback) = self.current_callback() else {
                return Err(TransportError::NoSubscriber { topic: self.topic.clone() });
            };
            self.delivered.fetch_add(1, Ordering::Relaxed);
            return callback(message);
        };

        // The callback check and the enqueue happen under the queue lock,
        // the same lock `set_callback` installs under.
        let callback = {
            let _rx = queue.rx();
            match self.current_callback() {
                Some(callback) => callback,
                None => return self.enqueue(queue, message),
            }
        };
        self.delivered.fetch_add(1, Ordering::Relaxed);
        callback(message)
    }

    fn enqueue(&self, queue: &Queue, message: WireMessage) -> Result<(), TransportError> {
        match queue.tx.try_send(message) {
            Ok(()) => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => match self.options.overflow {
                OverflowPolicy::Drop => {
                    tracing::warn!(topic = %self.topic, "broker queue full, dropping");
                    Ok(())
                }
                OverflowPolicy::Reject => Err(TransportError::QueueFull {
                    topic: self.topic.clone(),
                    capacity: queue.capacity,
                }),
            },
            // The broker owns the receiver, so the channel cannot close.
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(TransportError::NoSubscriber { topic: self.topic.clone() })
            }
        }
    }

    /// Pull the oldest queued message, `None` when the queue is empty.
    pub fn receive(&self) -> Option<WireMessage> {
        let queue = self.queue.as_ref()?;
        queue.rx().try_recv().ok()
    }

    /// Pull every queued message in publish order.
    pub fn drain(&self) -> Vec<WireMessage> {
        match &self.queue {
            Some(queue) => drain_rx(&mut queue.rx()),
            None => Vec::new(),
        }
    }

    /// Number of messages waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.as_ref().map_or(0, |q| q.rx().len())
    }

    /// Messages accepted so far (handed to a callback or queued).
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    fn current_callback(&self) -> Option<DeliveryCallback> {
        match self.callback.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => {
                tracing::warn!(topic = %self.topic, "broker callback lock was poisoned, recovering");
                poisoned.into_inner().clone()
            }
        }
    }

    fn callback_slot(&self) -> std::sync::RwLockWriteGuard<'_, Option<DeliveryCallback>> {
        match self.callback.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!(topic = %self.topic, "broker callback lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl MessagePublisher for MockBroker {
    fn publish(&self, message: WireMessage) -> Result<(), TransportError> {
        MockBroker::publish(self, message)
    }
}

fn drain_rx(rx: &mut mpsc::Receiver<WireMessage>) -> Vec<WireMessage> {
    let mut out = Vec::with_capacity(rx.len());
    while let Ok(message) = rx.try_recv() {
        out.push(message);
    }
    out
}
