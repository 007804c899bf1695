//! Integration tests for the delivery service
//!
//! Drives the retry engine and router through `DeliveryService` with scripted
//! senders and in-memory sinks. Backoff runs on paused tokio time, so
//! multi-second schedules finish instantly and can be measured exactly.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_core::delivery::{DeliveryService, RetryEngine, RetryPolicy};
use courier_core::testing::{InMemorySink, ScriptedSender};
use courier_core::{RequestSender, ResponseRouter};
use courier_domain::{
    CourierError, DeliveryOutcome, DeliveryResponse, InputRecord, Result, RetrySettings,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct Harness {
    sender: Arc<ScriptedSender>,
    success: Arc<InMemorySink>,
    errors: Arc<InMemorySink>,
    service: DeliveryService,
}

fn harness(sender: ScriptedSender, settings: RetrySettings) -> Harness {
    let sender = Arc::new(sender);
    let success = Arc::new(InMemorySink::new());
    let errors = Arc::new(InMemorySink::new());
    let router = ResponseRouter::new(success.clone(), errors.clone());
    let service = DeliveryService::new(
        sender.clone(),
        RetryEngine::new(RetryPolicy::from(&settings)),
        router,
    );
    Harness { sender, success, errors, service }
}

/// Sender that cancels the batch token while the request is in flight and
/// still reports a successful delivery.
struct CancelDuringSend {
    cancel: CancellationToken,
}

#[async_trait]
impl RequestSender for CancelDuringSend {
    async fn send(&self, _body: &[u8]) -> Result<DeliveryResponse> {
        self.cancel.cancel();
        Ok(DeliveryResponse::new(200))
    }
}

fn record(id: &str) -> InputRecord {
    InputRecord::new(format!(r#"{{"id":"{id}"}}"#)).with_position(id)
}

/// Validates that persistent 5xx responses use every attempt on the
/// documented backoff schedule.
///
/// # Test Steps
/// 1. Endpoint always answers 500, max_retries = 3
/// 2. Verify 4 attempts and an exhausted-retries error
/// 3. Verify total wait is 2 + 4 + 8 = 14 s of virtual time
#[tokio::test(start_paused = true)]
async fn test_server_errors_exhaust_retries_on_schedule() {
    let h = harness(ScriptedSender::always(500), RetrySettings::default());
    let start = Instant::now();

    let err = h
        .service
        .process_record(&CancellationToken::new(), &record("a"))
        .await
        .expect_err("delivery should fail");

    assert_eq!(h.sender.calls(), 4);
    assert_eq!(start.elapsed(), Duration::from_secs(14));
    assert_eq!(err, CourierError::RetryExhausted { max_retries: 3, last: "HTTP 500".into() });

    let errors = h.errors.records();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].http_status, Some(500));
    assert_eq!(errors[0].error_message.as_deref(), Some("max retries (3) exceeded: HTTP 500"));
    assert!(h.success.records().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_client_error_is_not_retried() {
    let h = harness(ScriptedSender::always(404), RetrySettings::default());

    let err = h
        .service
        .process_record(&CancellationToken::new(), &record("a"))
        .await
        .expect_err("404 is permanent");

    assert_eq!(h.sender.calls(), 1);
    assert_eq!(err, CourierError::NonRetryableStatus { status: 404 });
    assert_eq!(h.errors.records()[0].http_status, Some(404));
}

#[tokio::test(start_paused = true)]
async fn test_too_many_requests_respects_toggle() {
    let settings = RetrySettings { retry_on_429: false, ..RetrySettings::default() };
    let h = harness(ScriptedSender::always(429), settings);

    let err = h
        .service
        .process_record(&CancellationToken::new(), &record("a"))
        .await
        .expect_err("429 is permanent when retry_on_429 is off");

    assert_eq!(h.sender.calls(), 1);
    assert_eq!(err, CourierError::NonRetryableStatus { status: 429 });
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_then_success() {
    let sender = ScriptedSender::new([
        Err(CourierError::Transport("connection refused".into())),
        Ok(DeliveryResponse::new(503)),
        Ok(DeliveryResponse::new(200).with_body("ok")),
    ]);
    let h = harness(sender, RetrySettings::default());
    let start = Instant::now();

    let outcome = h
        .service
        .process_record(&CancellationToken::new(), &record("a"))
        .await
        .expect("third attempt succeeds");

    assert!(matches!(outcome, DeliveryOutcome::Success { attempts: 3, .. }));
    assert_eq!(start.elapsed(), Duration::from_secs(2 + 4));
    assert_eq!(h.success.records()[0].response_body.as_deref(), Some("ok"));
    assert!(h.errors.records().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_authentication_error_is_permanent() {
    let sender = ScriptedSender::new([Err(CourierError::Authentication("invalid_client".into()))]);
    let h = harness(sender, RetrySettings::default());

    let err = h
        .service
        .process_record(&CancellationToken::new(), &record("a"))
        .await
        .expect_err("auth failures are not retried");

    assert_eq!(h.sender.calls(), 1);
    assert!(matches!(err, CourierError::Authentication(_)));
    let errors = h.errors.records();
    assert!(errors[0].http_status.is_none());
    assert_eq!(errors[0].error_message.as_deref(), Some("Authentication error: invalid_client"));
}

/// Validates that cancelling during a backoff wait returns promptly.
///
/// # Test Steps
/// 1. Endpoint always answers 503; the first backoff is 2 s
/// 2. Cancel 500 ms into the wait
/// 3. Verify the call returns `Cancelled` well before the wait would end
#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff_returns_promptly() {
    let h = harness(ScriptedSender::always(503), RetrySettings::default());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = h.service.process_record(&cancel, &record("a")).await.expect_err("cancelled");

    assert_eq!(err, CourierError::Cancelled);
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(h.sender.calls(), 1);
    assert!(h.errors.records().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_batch_stops_at_first_failure() {
    let sender = ScriptedSender::new([
        Ok(DeliveryResponse::new(200)),
        Ok(DeliveryResponse::new(201)),
        Ok(DeliveryResponse::new(400)),
        Ok(DeliveryResponse::new(200)),
    ]);
    let h = harness(sender, RetrySettings::default());
    let batch = [record("a"), record("b"), record("c"), record("d")];

    let err = h
        .service
        .process_batch(&CancellationToken::new(), &batch)
        .await
        .expect_err("third record fails");

    assert_eq!(err.processed, 2);
    assert_eq!(err.source, CourierError::NonRetryableStatus { status: 400 });
    assert_eq!(h.sender.calls(), 3);

    let ids: Vec<String> = h.success.records().into_iter().map(|r| r.correlation_id).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(h.errors.records()[0].correlation_id, "c");
}

#[tokio::test]
async fn test_missing_payload_aborts_without_network() {
    let h = harness(ScriptedSender::always(200), RetrySettings::default());
    let empty = InputRecord::default().with_key("empty-1");
    let batch = [record("a"), empty, record("c")];

    let err = h
        .service
        .process_batch(&CancellationToken::new(), &batch)
        .await
        .expect_err("second record has no payload");

    assert_eq!(err.processed, 1);
    assert_eq!(err.source, CourierError::NoPayload);
    assert_eq!(h.sender.calls(), 1);

    let errors = h.errors.records();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].correlation_id, "empty-1");
    assert_eq!(errors[0].error_message.as_deref(), Some("record has no payload"));
}

#[tokio::test]
async fn test_full_batch_reports_every_record() -> anyhow::Result<()> {
    let h = harness(ScriptedSender::always(204), RetrySettings::default());
    let batch = [record("a"), record("b"), record("c")];

    let processed = h.service.process_batch(&CancellationToken::new(), &batch).await?;

    assert_eq!(processed, 3);
    assert_eq!(h.success.records().len(), 3);
    assert_eq!(h.sender.bodies()[1], br#"{"id":"b"}"#.to_vec());
    Ok(())
}

#[tokio::test]
async fn test_cancelled_token_stops_batch_before_sending() {
    let h = harness(ScriptedSender::always(200), RetrySettings::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h.service.process_batch(&cancel, &[record("a")]).await.expect_err("cancelled");

    assert_eq!(err.processed, 0);
    assert_eq!(err.source, CourierError::Cancelled);
    assert_eq!(h.sender.calls(), 0);
}

/// Validates that `max_retries = 0` makes a single attempt with no backoff.
///
/// # Test Steps
/// 1. Endpoint always answers 503, max_retries = 0
/// 2. Verify exactly one call and an exhausted-retries outcome
/// 3. Verify no virtual time passed
#[tokio::test(start_paused = true)]
async fn test_zero_retries_makes_single_attempt() {
    let settings = RetrySettings { max_retries: 0, ..RetrySettings::default() };
    let h = harness(ScriptedSender::always(503), settings.clone());
    let start = Instant::now();

    let err = h
        .service
        .process_record(&CancellationToken::new(), &record("a"))
        .await
        .expect_err("503 without retries fails");

    assert_eq!(h.sender.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(err, CourierError::RetryExhausted { max_retries: 0, last: "HTTP 503".into() });
    assert_eq!(h.errors.records()[0].http_status, Some(503));

    let engine = RetryEngine::new(RetryPolicy::from(&settings));
    let outcome = engine
        .run(&CancellationToken::new(), |_| async { Ok(DeliveryResponse::new(503)) })
        .await;
    assert!(matches!(outcome, DeliveryOutcome::ExhaustedRetries { attempts: 1, .. }));
}

#[tokio::test]
async fn test_delivery_cancelled_before_routing_is_not_processed() {
    let cancel = CancellationToken::new();
    let success = Arc::new(InMemorySink::new());
    let errors = Arc::new(InMemorySink::new());
    let service = DeliveryService::new(
        Arc::new(CancelDuringSend { cancel: cancel.clone() }),
        RetryEngine::new(RetryPolicy::from(&RetrySettings::default())),
        ResponseRouter::new(success.clone(), errors.clone()),
    );

    let err = service.process_batch(&cancel, &[record("a"), record("b")]).await.expect_err("cancelled");

    assert_eq!(err.processed, 0);
    assert_eq!(err.source, CourierError::Cancelled);
    assert!(success.records().is_empty());
    assert!(errors.records().is_empty());
}
