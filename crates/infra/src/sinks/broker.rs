//! Broker sink

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::{BrokerMessage, MessagePublisher, ResponseSink, SinkError};
use courier_domain::ResponseRecord;
use serde_json::Value;
use tracing::debug;

/// Publishes each response record as one broker message.
///
/// The message key is the correlation ID and the value is the record as
/// JSON with response headers collapsed to their first value. Out-of-band
/// headers carry `correlation_id`, `outcome`, `http_status`, the request
/// method and URL, and the input record's metadata when the record embeds
/// it.
pub struct BrokerSink {
    publisher: Arc<dyn MessagePublisher>,
    topic: String,
    request_method: String,
    request_url: String,
    closed: AtomicBool,
}

impl BrokerSink {
    pub fn new(
        publisher: Arc<dyn MessagePublisher>,
        topic: impl Into<String>,
        request_method: impl Into<String>,
        request_url: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            request_method: request_method.into(),
            request_url: request_url.into(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Build the message for `record` without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Encode`] if the record cannot be serialized.
    pub fn message_for(&self, record: &ResponseRecord) -> Result<BrokerMessage, SinkError> {
        let body = record.clone().with_flattened_headers();
        let value = serde_json::to_vec(&body).map_err(|e| SinkError::Encode(e.to_string()))?;

        let outcome = if record.is_error() { "error" } else { "success" };
        let mut headers = vec![
            ("correlation_id".to_string(), record.correlation_id.clone()),
            ("outcome".to_string(), outcome.to_string()),
        ];
        if let Some(status) = record.http_status {
            headers.push(("http_status".to_string(), status.to_string()));
        }
        headers.push(("request_method".to_string(), self.request_method.clone()));
        headers.push(("request_url".to_string(), self.request_url.clone()));

        let metadata = record
            .original_record
            .as_ref()
            .and_then(|original| original.get("metadata"))
            .and_then(Value::as_object);
        if let Some(metadata) = metadata {
            for (key, value) in metadata {
                let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                headers.push((key.clone(), value));
            }
        }

        Ok(BrokerMessage {
            topic: self.topic.clone(),
            key: record.correlation_id.clone().into_bytes(),
            value,
            headers,
        })
    }
}

#[async_trait]
impl ResponseSink for BrokerSink {
    async fn publish(&self, record: &ResponseRecord) -> Result<(), SinkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }
        let message = self.message_for(record)?;
        self.publisher.publish(message).await?;
        debug!(
            topic = %self.topic,
            correlation_id = %record.correlation_id,
            "published response record"
        );
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.publisher.close().await
    }
}

impl std::fmt::Debug for BrokerSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerSink")
            .field("topic", &self.topic)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use courier_core::testing::RecordingPublisher;
    use courier_domain::{DeliveryResponse, InputRecord};

    use super::*;

    fn sink(publisher: Arc<RecordingPublisher>) -> BrokerSink {
        BrokerSink::new(publisher, "responses", "POST", "https://api.example.com/orders")
    }

    #[tokio::test]
    async fn success_message_layout() {
        let publisher = Arc::new(RecordingPublisher::new());
        let response = DeliveryResponse::new(201)
            .with_body(r#"{"id":"1"}"#)
            .with_header("content-type", "application/json")
            .with_header("set-cookie", "a=1")
            .with_header("set-cookie", "b=2");
        let record = ResponseRecord::new("c-1", Utc::now()).with_response(&response, true);

        sink(publisher.clone()).publish(&record).await.unwrap();

        let messages = publisher.messages();
        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.topic, "responses");
        assert_eq!(message.key, b"c-1");
        assert_eq!(message.header("correlation_id"), Some("c-1"));
        assert_eq!(message.header("outcome"), Some("success"));
        assert_eq!(message.header("http_status"), Some("201"));
        assert_eq!(message.header("request_method"), Some("POST"));
        assert_eq!(message.header("request_url"), Some("https://api.example.com/orders"));

        let body: Value = serde_json::from_slice(&message.value).unwrap();
        assert_eq!(body["response_headers"]["Set-Cookie"], "a=1");
        assert_eq!(body["response_headers"]["Content-Type"], "application/json");
    }

    #[tokio::test]
    async fn error_message_carries_input_metadata() {
        let publisher = Arc::new(RecordingPublisher::new());
        let input = InputRecord::new("{}").with_metadata("tenant", "acme");
        let record = ResponseRecord::new("c-2", Utc::now())
            .with_error("Transport error: connection refused")
            .with_original_record(input.snapshot());

        sink(publisher.clone()).publish(&record).await.unwrap();

        let message = &publisher.messages()[0];
        assert_eq!(message.header("outcome"), Some("error"));
        assert_eq!(message.header("http_status"), None);
        assert_eq!(message.header("tenant"), Some("acme"));
    }

    #[tokio::test]
    async fn publisher_failure_surfaces_and_close_is_idempotent() {
        let failing = Arc::new(RecordingPublisher::failing());
        let sink = sink(failing.clone());
        let record = ResponseRecord::new("c-3", Utc::now());

        assert!(matches!(sink.publish(&record).await, Err(SinkError::Publish(_))));

        sink.close().await.unwrap();
        sink.close().await.unwrap();
        assert!(failing.is_closed());
        assert_eq!(sink.publish(&record).await, Err(SinkError::Closed));
    }
}
