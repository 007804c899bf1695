//! Per-record delivery: body selection, retries, routing

use std::sync::Arc;

use courier_domain::{BatchWriteError, CourierError, DeliveryOutcome, InputRecord, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info_span, warn, Instrument};

use super::correlation::correlation_id;
use super::payload::request_body;
use super::ports::RequestSender;
use super::retry::RetryEngine;
use crate::routing::{ResponseRouter, Route};

/// Delivery service
///
/// Processes records one at a time, in order. The first failure stops the
/// batch; records delivered before it stay delivered.
#[derive(Clone)]
pub struct DeliveryService {
    sender: Arc<dyn RequestSender>,
    engine: RetryEngine,
    router: ResponseRouter,
    use_payload_after: bool,
}

impl DeliveryService {
    /// Create a new delivery service
    pub fn new(sender: Arc<dyn RequestSender>, engine: RetryEngine, router: ResponseRouter) -> Self {
        Self { sender, engine, router, use_payload_after: true }
    }

    /// Use the after-payload as request body when present (default on)
    pub fn with_payload_after(mut self, enabled: bool) -> Self {
        self.use_payload_after = enabled;
        self
    }

    pub fn router(&self) -> &ResponseRouter {
        &self.router
    }

    /// Deliver every record of `records` in order.
    ///
    /// # Errors
    ///
    /// Returns a [`BatchWriteError`] carrying the number of records processed
    /// before the failing one and the failure itself.
    pub async fn process_batch(
        &self,
        cancel: &CancellationToken,
        records: &[InputRecord],
    ) -> std::result::Result<usize, BatchWriteError> {
        for (index, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(BatchWriteError::new(index, CourierError::Cancelled));
            }
            if let Err(e) = self.process_record(cancel, record).await {
                error!(processed = index, error = %e, "batch aborted");
                return Err(BatchWriteError::new(index, e));
            }
        }
        Ok(records.len())
    }

    /// Deliver one record and route its outcome.
    ///
    /// # Errors
    ///
    /// Returns the cause of any non-success outcome, or
    /// [`CourierError::NoPayload`] when the record has nothing to send.
    /// A delivery that succeeded after `cancel` fired returns
    /// [`CourierError::Cancelled`] when its response record was not written.
    pub async fn process_record(
        &self,
        cancel: &CancellationToken,
        record: &InputRecord,
    ) -> Result<DeliveryOutcome> {
        let correlation_id = correlation_id(record);
        let span = info_span!("deliver", correlation_id = %correlation_id);

        async {
            let body = match request_body(record, self.use_payload_after) {
                Ok(body) => body,
                Err(e) => {
                    error!(error = %e, "failed to prepare request body");
                    self.router.route_failure(cancel, &correlation_id, record, &e).await;
                    return Err(e);
                }
            };

            let sender = &self.sender;
            let outcome = self.engine.run(cancel, |_| sender.send(body)).await;
            let route = self.router.route(cancel, &correlation_id, record, &outcome).await;

            match outcome.error() {
                Some(e) => {
                    error!(attempts = outcome.attempts(), error = %e, "delivery failed");
                    Err(e)
                }
                // Delivered, but cancelled before its response record was
                // written; it does not count as processed.
                None if route == Route::Skipped => {
                    warn!(attempts = outcome.attempts(), "delivered but cancelled before routing");
                    Err(CourierError::Cancelled)
                }
                None => Ok(outcome),
            }
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for DeliveryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryService")
            .field("engine", &self.engine)
            .field("router", &self.router)
            .field("use_payload_after", &self.use_payload_after)
            .finish_non_exhaustive()
    }
}
