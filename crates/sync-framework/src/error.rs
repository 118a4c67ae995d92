//! # Framework Errors
//!
//! This module defines the error types shared by the broker abstraction, the
//! envelope codec and the background loops. Domain crates wrap these in their
//! own per-service error enums.

/// Errors raised by a broker connection or one of its channels.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Broker unavailable: {0}")]
    Unavailable(String),
    #[error("Channel closed")]
    ChannelClosed,
    #[error("Exchange not found: {0}")]
    ExchangeNotFound(String),
    #[error("Queue not found: {0}")]
    QueueNotFound(String),
    #[error("Unknown delivery tag: {0}")]
    UnknownDeliveryTag(u64),
    #[error("Publish failed: {0}")]
    PublishFailed(String),
}

/// Errors raised while converting records to and from their wire form.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Encode failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Decode failed: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Errors that end a background loop or reject a caller.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Transport failure: {0}")]
    Transport(#[from] BrokerError),
    #[error("Topology missing after re-declaration: {}", .0.join(", "))]
    TopologyMissing(Vec<String>),
    #[error("Dispatch queue closed")]
    DispatchClosed,
    #[error("Identifier space exhausted")]
    IdsExhausted,
    #[error("Background task `{name}` failed: {reason}")]
    TaskFailed { name: &'static str, reason: String },
}
