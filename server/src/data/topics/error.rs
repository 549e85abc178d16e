//! Topic error types

use thiserror::Error;

/// Error type for topic operations
#[derive(Debug, Error)]
pub enum TopicError {
    /// Channel closed or service shut down
    #[error("channel closed")]
    ChannelClosed,
    /// Byte budget exhausted (backpressure)
    #[error("buffer full")]
    BufferFull,
    /// Topic exists with different message type
    #[error("topic '{0}' already exists with different type")]
    TypeMismatch(String),
    /// Stream topics have exactly one consumer
    #[error("topic '{0}' already has a consumer")]
    ConsumerAttached(String),
    /// Ack for a delivery id that is not in flight
    #[error("message {0} is not pending")]
    UnknownMessage(u64),
}
