//! Port interfaces for delivery

use async_trait::async_trait;
use courier_domain::{DeliveryResponse, Result};

/// Trait for issuing a single HTTP delivery attempt
///
/// Implementations return `Ok` for every HTTP status, non-2xx included, and
/// reserve `Err` for transport, authentication and request-construction
/// failures.
#[async_trait]
pub trait RequestSender: Send + Sync {
    /// Send `body` once and buffer the full response
    async fn send(&self, body: &[u8]) -> Result<DeliveryResponse>;
}
