//! Error types used throughout the delivery engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Courier
///
/// Every failure that can end a delivery sequence maps onto one of these
/// variants. The variant decides both how the retry engine classifies the
/// failure and how the destination surfaces it to the host.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum CourierError {
    /// Missing or invalid configuration. Fatal at open time, never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Token acquisition or renewal failed.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// DNS, connection refused, TLS or timeout failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a status that must not be retried.
    #[error("non-retryable error: status {status}")]
    NonRetryableStatus { status: u16 },

    /// The failure was retryable but every attempt has been used.
    #[error("max retries ({max_retries}) exceeded: {last}")]
    RetryExhausted { max_retries: u32, last: String },

    /// The record carries neither an after nor a before payload.
    #[error("record has no payload")]
    NoPayload,

    /// A success or error sink could not persist a response record.
    #[error("Sink write error: {0}")]
    SinkWrite(String),

    /// The surrounding operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Shorthand for [`CourierError::Configuration`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether this error came from the network layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result type alias for Courier operations
pub type Result<T> = std::result::Result<T, CourierError>;

/// Failure of a batch write.
///
/// `processed` counts the records that were fully delivered and routed
/// before the failing one. Those records are not rolled back. A record that
/// was delivered but cancelled before its response record was written is
/// not counted; its `source` is [`CourierError::Cancelled`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("batch stopped after {processed} record(s): {source}")]
pub struct BatchWriteError {
    pub processed: usize,
    #[source]
    pub source: CourierError,
}

impl BatchWriteError {
    pub fn new(processed: usize, source: CourierError) -> Self {
        Self { processed, source }
    }
}
