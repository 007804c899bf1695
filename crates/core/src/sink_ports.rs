//! Port interfaces for response sinks
//!
//! A sink receives one [`ResponseRecord`] per delivered record. Every
//! `publish` is atomic from the caller's point of view: either the whole
//! record is handed over or an error is returned.

use async_trait::async_trait;
use courier_domain::{CourierError, ResponseRecord};
use thiserror::Error;

/// Errors raised by sinks and message publishers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The record could not be encoded.
    #[error("failed to encode response record: {0}")]
    Encode(String),

    /// Local I/O failed (file sinks).
    #[error("sink I/O error: {0}")]
    Io(String),

    /// The broker rejected or failed to receive the message.
    #[error("failed to publish message: {0}")]
    Publish(String),

    /// The sink was already closed.
    #[error("sink is closed")]
    Closed,
}

impl From<SinkError> for CourierError {
    fn from(err: SinkError) -> Self {
        Self::SinkWrite(err.to_string())
    }
}

/// Trait for downstream consumers of response records
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Persist or forward one response record
    async fn publish(&self, record: &ResponseRecord) -> Result<(), SinkError>;

    /// Flush and release resources; later publishes fail with
    /// [`SinkError::Closed`]
    async fn close(&self) -> Result<(), SinkError>;
}

/// A message ready to be handed to a broker producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    pub topic: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    /// Out-of-band headers, in insertion order.
    pub headers: Vec<(String, String)>,
}

impl BrokerMessage {
    /// First header value with the given name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }
}

/// Trait for the host-supplied broker producer
///
/// The delivery engine never speaks a broker wire protocol itself; the host
/// injects a producer that implements this trait.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish one message and wait for the broker's acknowledgement
    async fn publish(&self, message: BrokerMessage) -> Result<(), SinkError>;

    /// Release the producer
    async fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
