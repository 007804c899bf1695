//! Hosting contract for destinations

use async_trait::async_trait;
use courier_domain::constants::{CONNECTOR_NAME, CONNECTOR_VERSION};
use courier_domain::{BatchWriteError, DestinationConfig, InputRecord, Result};
use tokio_util::sync::CancellationToken;

/// Descriptive metadata a connector reports to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorSpec {
    pub name: &'static str,
    pub summary: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub author: &'static str,
}

impl ConnectorSpec {
    /// Metadata of the HTTP destination.
    pub const fn http() -> Self {
        Self {
            name: CONNECTOR_NAME,
            summary: "HTTP destination with authentication, retries and response routing",
            description: "Delivers each record as an HTTP request (POST, PUT or PATCH) with \
                          pluggable authentication (none, basic, bearer, OAuth2 client \
                          credentials), exponential-backoff retries, and routing of every \
                          response to a success or error sink (NDJSON file or message broker).",
            version: CONNECTOR_VERSION,
            author: "Courier Team",
        }
    }
}

/// Lifecycle a host drives a destination through
///
/// `open` and `teardown` take `&mut self`, so they never overlap with
/// `write`; `write` itself may be called from several tasks at once.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connector metadata
    fn spec(&self) -> ConnectorSpec;

    /// Called once when the connector is first created
    async fn on_created(&self, _config: &DestinationConfig) -> Result<()> {
        Ok(())
    }

    /// Called when the host changes the configuration
    async fn on_updated(
        &self,
        _before: &DestinationConfig,
        _after: &DestinationConfig,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when the connector is deleted
    async fn on_deleted(&self, _config: &DestinationConfig) -> Result<()> {
        Ok(())
    }

    /// Validate the configuration and build every component
    async fn open(&mut self, config: DestinationConfig) -> Result<()>;

    /// Deliver a batch in order, returning how many records were processed
    ///
    /// On failure, `BatchWriteError::processed` is the number of records
    /// fully processed before the failing one.
    async fn write(
        &self,
        cancel: &CancellationToken,
        records: &[InputRecord],
    ) -> std::result::Result<usize, BatchWriteError>;

    /// Close sinks and release resources
    async fn teardown(&mut self) -> Result<()>;
}
