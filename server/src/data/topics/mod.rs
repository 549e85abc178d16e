//! In-process message channel
//!
//! Named stream topics carry typed messages from publishers to a single
//! consumer. Each topic is a bounded mpsc queue guarded by a byte budget.
//! A message holds its share of the budget from publish until the consumer
//! acks it, so `BufferFull` tracks how far the consumer is behind.
//!
//! Sensor messages enter through the publish bridge and leave through
//! the ingestion dispatcher. On shutdown publishers are refused, the
//! consumer drains what is queued and the service reports itself
//! disconnected.

mod error;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, watch};

pub use error::TopicError;

use crate::core::constants::{
    DEFAULT_TOPIC_BUFFER_SIZE, DEFAULT_TOPIC_CHANNEL_CAPACITY, ENV_TOPIC_BUFFER_SIZE,
    ENV_TOPIC_CHANNEL_CAPACITY,
};

// ============================================================================
// TOPIC MESSAGE TRAIT
// ============================================================================

/// Trait for messages that can be published to topics
pub trait TopicMessage: Send + Sync + 'static {
    /// Estimate message size in bytes for backpressure
    fn size_bytes(&self) -> usize;
}

// ============================================================================
// TOPIC CONFIG
// ============================================================================

/// Topic buffer limits
#[derive(Debug, Clone)]
pub struct TopicConfig {
    pub buffer_size: usize,
    pub channel_capacity: usize,
}

impl Default for TopicConfig {
    fn default() -> Self {
        let buffer_size = std::env::var(ENV_TOPIC_BUFFER_SIZE)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOPIC_BUFFER_SIZE);

        let channel_capacity = std::env::var(ENV_TOPIC_CHANNEL_CAPACITY)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOPIC_CHANNEL_CAPACITY);

        Self {
            buffer_size,
            channel_capacity,
        }
    }
}

// ============================================================================
// PUBLISHER
// ============================================================================

/// Publisher handle - clone and share across producers
#[derive(Debug)]
pub struct Publisher<T: TopicMessage> {
    tx: mpsc::Sender<T>,
    pending_bytes: Arc<AtomicUsize>,
    max_bytes: usize,
    closed: watch::Receiver<bool>,
}

impl<T: TopicMessage> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            pending_bytes: self.pending_bytes.clone(),
            max_bytes: self.max_bytes,
            closed: self.closed.clone(),
        }
    }
}

impl<T: TopicMessage> Publisher<T> {
    /// Publish without waiting; fails with `BufferFull` while unacked messages use up the budget
    pub fn publish(&self, msg: T) -> Result<(), TopicError> {
        if *self.closed.borrow() {
            return Err(TopicError::ChannelClosed);
        }

        let size = msg.size_bytes();
        self.reserve(size)?;

        self.tx.try_send(msg).map_err(|err| {
            self.pending_bytes.fetch_sub(size, Ordering::SeqCst);
            match err {
                mpsc::error::TrySendError::Full(_) => TopicError::BufferFull,
                mpsc::error::TrySendError::Closed(_) => TopicError::ChannelClosed,
            }
        })
    }

    fn reserve(&self, size: usize) -> Result<(), TopicError> {
        let mut current = self.pending_bytes.load(Ordering::Relaxed);
        loop {
            if current + size > self.max_bytes {
                return Err(TopicError::BufferFull);
            }
            match self.pending_bytes.compare_exchange(
                current,
                current + size,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }
}

// ============================================================================
// STREAM SUBSCRIBER / ACKER
// ============================================================================

/// Releases the budget held by delivered messages
#[derive(Clone)]
pub struct StreamAcker {
    in_flight: Arc<Mutex<HashMap<u64, usize>>>,
    pending_bytes: Arc<AtomicUsize>,
}

impl StreamAcker {
    /// Mark a delivered message as handled
    pub fn ack(&self, id: u64) -> Result<(), TopicError> {
        let size = self
            .in_flight
            .lock()
            .remove(&id)
            .ok_or(TopicError::UnknownMessage(id))?;
        self.pending_bytes.fetch_sub(size, Ordering::SeqCst);
        Ok(())
    }
}

/// The single consumer of a stream topic
pub struct StreamSubscriber<T: TopicMessage> {
    rx: mpsc::Receiver<T>,
    closed: watch::Receiver<bool>,
    acker: StreamAcker,
    next_id: u64,
}

impl<T: TopicMessage> StreamSubscriber<T> {
    /// Next message with its delivery id.
    ///
    /// After shutdown, queued messages are still delivered; `ChannelClosed`
    /// is returned once the queue is empty.
    pub async fn recv(&mut self) -> Result<(u64, T), TopicError> {
        loop {
            match self.rx.try_recv() {
                Ok(msg) => return Ok(self.track(msg)),
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    return Err(TopicError::ChannelClosed);
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
            }
            if *self.closed.borrow() {
                return Err(TopicError::ChannelClosed);
            }

            let msg = tokio::select! {
                msg = self.rx.recv() => msg,
                changed = self.closed.changed() => {
                    if changed.is_err() {
                        return Err(TopicError::ChannelClosed);
                    }
                    continue;
                }
            };
            return match msg {
                Some(msg) => Ok(self.track(msg)),
                None => Err(TopicError::ChannelClosed),
            };
        }
    }

    pub fn acker(&self) -> StreamAcker {
        self.acker.clone()
    }

    fn track(&mut self, msg: T) -> (u64, T) {
        let id = self.next_id;
        self.next_id += 1;
        self.acker.in_flight.lock().insert(id, msg.size_bytes());
        (id, msg)
    }
}

// ============================================================================
// TOPIC HANDLE
// ============================================================================

/// Handle to a named stream topic
pub struct Topic<T: TopicMessage> {
    name: String,
    publisher: Publisher<T>,
    receiver: Arc<Mutex<Option<mpsc::Receiver<T>>>>,
}

impl<T: TopicMessage> Clone for Topic<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            publisher: self.publisher.clone(),
            receiver: self.receiver.clone(),
        }
    }
}

impl<T: TopicMessage> Topic<T> {
    pub fn publisher(&self) -> Publisher<T> {
        self.publisher.clone()
    }

    /// Attach the consumer; a topic accepts one for its lifetime
    pub fn stream_subscribe(&self) -> Result<StreamSubscriber<T>, TopicError> {
        let rx = self
            .receiver
            .lock()
            .take()
            .ok_or_else(|| TopicError::ConsumerAttached(self.name.clone()))?;

        Ok(StreamSubscriber {
            rx,
            closed: self.publisher.closed.clone(),
            acker: StreamAcker {
                in_flight: Arc::new(Mutex::new(HashMap::new())),
                pending_bytes: self.publisher.pending_bytes.clone(),
            },
            next_id: 0,
        })
    }
}

// ============================================================================
// TOPIC SERVICE
// ============================================================================

trait AnyTopic: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: TopicMessage> AnyTopic for Topic<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

type TopicMap = HashMap<String, Arc<dyn AnyTopic>>;

/// Owns all topics and the shared close signal
pub struct TopicService {
    topics: RwLock<TopicMap>,
    config: TopicConfig,
    closed_tx: watch::Sender<bool>,
}

impl TopicService {
    pub fn new() -> Self {
        Self::with_config(TopicConfig::default())
    }

    pub fn with_config(config: TopicConfig) -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            topics: RwLock::new(HashMap::new()),
            config,
            closed_tx,
        }
    }

    /// True until `shutdown` is called
    pub fn is_connected(&self) -> bool {
        !*self.closed_tx.borrow()
    }

    /// Create a stream topic or return the existing one with the same message type
    pub fn topic<T: TopicMessage>(&self, name: &str) -> Result<Topic<T>, TopicError> {
        let mut topics = self.topics.write();

        if let Some(existing) = topics.get(name) {
            return existing
                .as_any()
                .downcast_ref::<Topic<T>>()
                .cloned()
                .ok_or_else(|| TopicError::TypeMismatch(name.to_string()));
        }

        if !self.is_connected() {
            return Err(TopicError::ChannelClosed);
        }

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let topic = Topic {
            name: name.to_string(),
            publisher: Publisher {
                tx,
                pending_bytes: Arc::new(AtomicUsize::new(0)),
                max_bytes: self.config.buffer_size,
                closed: self.closed_tx.subscribe(),
            },
            receiver: Arc::new(Mutex::new(Some(rx))),
        };

        topics.insert(name.to_string(), Arc::new(topic.clone()));
        tracing::debug!(topic = %name, "Topic created");

        Ok(topic)
    }

    /// Refuse new messages and let consumers drain what is queued
    pub fn shutdown(&self) {
        self.closed_tx.send_replace(true);
        tracing::debug!(topics = self.topics.read().len(), "Topic service closed");
    }
}

impl Default for TopicService {
    fn default() -> Self {
        Self::new()
    }
}
