//! Routes delivery outcomes to the success or error sink

use std::sync::Arc;

use chrono::Utc;
use courier_domain::{CourierError, DeliveryOutcome, DeliveryResponse, InputRecord, ResponseRecord};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::sink_ports::ResponseSink;

/// Which sink a record went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Success,
    Error,
    /// Nothing was published (the operation was cancelled).
    Skipped,
}

/// Builds response records and hands each to exactly one sink.
///
/// Sink failures are logged and swallowed: they never replace the delivery
/// result the caller sees. A cancelled token stops a record from being
/// published, but a publish that has started runs to completion.
#[derive(Clone)]
pub struct ResponseRouter {
    success: Arc<dyn ResponseSink>,
    error: Arc<dyn ResponseSink>,
    include_response_headers: bool,
    include_request_metadata: bool,
}

impl ResponseRouter {
    pub fn new(success: Arc<dyn ResponseSink>, error: Arc<dyn ResponseSink>) -> Self {
        Self { success, error, include_response_headers: true, include_request_metadata: false }
    }

    /// Copy response headers into records (default on).
    pub fn with_response_headers(mut self, enabled: bool) -> Self {
        self.include_response_headers = enabled;
        self
    }

    /// Embed a snapshot of the input record in records (default off).
    pub fn with_request_metadata(mut self, enabled: bool) -> Self {
        self.include_request_metadata = enabled;
        self
    }

    /// Build the record for a delivery outcome.
    ///
    /// Returns `None` for cancelled deliveries.
    pub fn record_for(
        &self,
        correlation_id: &str,
        input: &InputRecord,
        outcome: &DeliveryOutcome,
    ) -> Option<ResponseRecord> {
        match outcome {
            DeliveryOutcome::Cancelled { .. } => None,
            DeliveryOutcome::Success { response, .. } => {
                Some(self.base(correlation_id, input, Some(response)))
            }
            failure => {
                let message = failure.error().map(|e| e.to_string()).unwrap_or_default();
                Some(self.base(correlation_id, input, failure.response()).with_error(message))
            }
        }
    }

    /// Build an error record for a failure that happened before delivery.
    pub fn failure_record(
        &self,
        correlation_id: &str,
        input: &InputRecord,
        error: &CourierError,
    ) -> ResponseRecord {
        self.base(correlation_id, input, None).with_error(error.to_string())
    }

    /// Route the outcome of one delivery.
    pub async fn route(
        &self,
        cancel: &CancellationToken,
        correlation_id: &str,
        input: &InputRecord,
        outcome: &DeliveryOutcome,
    ) -> Route {
        let Some(record) = self.record_for(correlation_id, input, outcome) else {
            debug!(correlation_id, "delivery cancelled, no response record written");
            return Route::Skipped;
        };

        if outcome.is_success() {
            self.publish(cancel, self.success.as_ref(), &record, Route::Success).await
        } else {
            self.publish(cancel, self.error.as_ref(), &record, Route::Error).await
        }
    }

    /// Route a failure that happened before any request was sent.
    pub async fn route_failure(
        &self,
        cancel: &CancellationToken,
        correlation_id: &str,
        input: &InputRecord,
        error: &CourierError,
    ) -> Route {
        let record = self.failure_record(correlation_id, input, error);
        self.publish(cancel, self.error.as_ref(), &record, Route::Error).await
    }

    /// Close both sinks, returning the first error.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::SinkWrite`] if either sink fails to close.
    pub async fn close(&self) -> courier_domain::Result<()> {
        let success = self.success.close().await;
        let error = self.error.close().await;
        success?;
        error?;
        Ok(())
    }

    fn base(
        &self,
        correlation_id: &str,
        input: &InputRecord,
        response: Option<&DeliveryResponse>,
    ) -> ResponseRecord {
        let mut record = ResponseRecord::new(correlation_id, Utc::now());
        if let Some(response) = response {
            record = record.with_response(response, self.include_response_headers);
        }
        if self.include_request_metadata {
            record = record.with_original_record(input.snapshot());
        }
        record
    }

    async fn publish(
        &self,
        cancel: &CancellationToken,
        sink: &dyn ResponseSink,
        record: &ResponseRecord,
        route: Route,
    ) -> Route {
        // Cancellation is honoured before a write starts, never during one:
        // a sink must not be left holding half a record.
        if cancel.is_cancelled() {
            warn!(correlation_id = %record.correlation_id, "cancelled before response record was published");
            return Route::Skipped;
        }
        if let Err(e) = sink.publish(record).await {
            warn!(
                correlation_id = %record.correlation_id,
                route = ?route,
                error = %e,
                "failed to publish response record"
            );
        }
        route
    }
}

impl std::fmt::Debug for ResponseRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseRouter")
            .field("include_response_headers", &self.include_response_headers)
            .field("include_request_metadata", &self.include_request_metadata)
            .finish_non_exhaustive()
    }
}
