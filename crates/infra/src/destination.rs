//! HTTP destination
//!
//! Wires configuration into a running delivery pipeline:
//!
//! ```text
//! records ─▶ DeliveryService ─▶ RetryEngine ─▶ DeliveryClient ─▶ endpoint
//!                   │
//!                   └─▶ ResponseRouter ─▶ success sink / error sink
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use courier_common::utils::env::{load_headers, load_headers_from_env};
use courier_core::{
    Connector, ConnectorSpec, DeliveryService, MessagePublisher, ResponseRouter, ResponseSink,
    RetryEngine, RetryPolicy,
};
use courier_domain::{
    BatchWriteError, CourierError, DestinationConfig, InputRecord, Result, SinkConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::auth::AuthStrategy;
use crate::http::DeliveryClient;
use crate::sinks::{BrokerSink, FileSink};

/// A configured, running pipeline.
#[derive(Debug)]
struct Pipeline {
    config: DestinationConfig,
    service: DeliveryService,
}

/// Connector that delivers records to an HTTP endpoint.
///
/// Build one with [`Destination::new`], inject a broker publisher if any sink
/// is a broker, then drive it through the [`Connector`] lifecycle.
#[derive(Default)]
pub struct Destination {
    publisher: Option<Arc<dyn MessagePublisher>>,
    env: Option<Vec<(String, String)>>,
    pipeline: Option<Pipeline>,
}

impl Destination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer used by broker sinks.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn MessagePublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Read environment headers from `snapshot` instead of the process
    /// environment.
    #[must_use]
    pub fn with_env<I>(mut self, snapshot: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env = Some(snapshot.into_iter().collect());
        self
    }

    pub fn is_open(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Configuration of the open pipeline.
    pub fn config(&self) -> Option<&DestinationConfig> {
        self.pipeline.as_ref().map(|p| &p.config)
    }

    fn env_headers(&self, prefix: &str) -> BTreeMap<String, String> {
        match &self.env {
            Some(snapshot) => load_headers(prefix, snapshot.iter().cloned()),
            None => load_headers_from_env(prefix),
        }
    }

    async fn build_sink(
        &self,
        key: &str,
        sink: &SinkConfig,
        config: &DestinationConfig,
    ) -> Result<Arc<dyn ResponseSink>> {
        match sink {
            SinkConfig::File { path } => {
                let sink = FileSink::open(path)
                    .await
                    .map_err(|e| CourierError::config(format!("{key}: {e}")))?;
                Ok(Arc::new(sink))
            }
            SinkConfig::Broker { topic } => {
                let publisher = self.publisher.clone().ok_or_else(|| {
                    CourierError::config(format!(
                        "{key} is a broker sink but no message publisher was supplied"
                    ))
                })?;
                Ok(Arc::new(BrokerSink::new(
                    publisher,
                    topic.as_str(),
                    config.method.to_string(),
                    config.url.as_str(),
                )))
            }
        }
    }

    async fn build_pipeline(&self, config: DestinationConfig) -> Result<Pipeline> {
        config.validate()?;

        let env_headers = self.env_headers(&config.env_header_prefix);
        let auth = AuthStrategy::from_config(&config.auth)?;
        let client = DeliveryClient::from_config(&config, env_headers, auth)?;

        let success = self.build_sink("successSink", &config.success_sink, &config).await?;
        let error = self.build_sink("errorSink", &config.error_sink, &config).await?;
        let router = ResponseRouter::new(success, error)
            .with_response_headers(config.include_response_headers)
            .with_request_metadata(config.include_request_metadata);

        let engine = RetryEngine::new(RetryPolicy::from(&config.retry));
        let service = DeliveryService::new(Arc::new(client), engine, router)
            .with_payload_after(config.use_payload_after);

        Ok(Pipeline { config, service })
    }
}

#[async_trait]
impl Connector for Destination {
    fn spec(&self) -> ConnectorSpec {
        ConnectorSpec::http()
    }

    async fn open(&mut self, config: DestinationConfig) -> Result<()> {
        let pipeline = self.build_pipeline(config).await?;

        if let Some(previous) = self.pipeline.take() {
            warn!("destination re-opened, closing previous sinks");
            if let Err(e) = previous.service.router().close().await {
                warn!(error = %e, "failed to close previous sinks");
            }
        }

        info!(
            url = %pipeline.config.url,
            method = %pipeline.config.method,
            auth = pipeline.config.auth.kind(),
            max_retries = pipeline.config.retry.max_retries,
            "destination opened"
        );
        self.pipeline = Some(pipeline);
        Ok(())
    }

    async fn write(
        &self,
        cancel: &CancellationToken,
        records: &[InputRecord],
    ) -> std::result::Result<usize, BatchWriteError> {
        let Some(pipeline) = &self.pipeline else {
            return Err(BatchWriteError::new(0, CourierError::config("destination is not open")));
        };
        pipeline.service.process_batch(cancel, records).await
    }

    async fn teardown(&mut self) -> Result<()> {
        let Some(pipeline) = self.pipeline.take() else {
            return Ok(());
        };
        pipeline.service.router().close().await?;
        info!(url = %pipeline.config.url, "destination torn down");
        Ok(())
    }
}

impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Destination")
            .field("has_publisher", &self.publisher.is_some())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
