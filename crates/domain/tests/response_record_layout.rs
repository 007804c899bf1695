//! Persisted layout of response records built from real records and responses

use chrono::{TimeZone, Utc};
use courier_domain::{DeliveryResponse, InputRecord, Operation, ResponseRecord};

#[test]
fn error_record_carries_original_record_snapshot() -> anyhow::Result<()> {
    let record = InputRecord::new(r#"{"order":42}"#)
        .with_operation(Operation::Update)
        .with_payload_before(r#"{"order":41}"#)
        .with_key("order-42")
        .with_metadata("source", "orders");
    let response = DeliveryResponse::new(503)
        .with_body("unavailable")
        .with_header("retry-after", "5");
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().expect("valid timestamp");

    let persisted = ResponseRecord::new("order-42", at)
        .with_response(&response, true)
        .with_error("max retries (3) exceeded: HTTP 503")
        .with_original_record(record.snapshot());

    let line = serde_json::to_string(&persisted)?;
    let positions: Vec<usize> = [
        "\"correlation_id\"",
        "\"timestamp\"",
        "\"http_status\"",
        "\"response_body\"",
        "\"response_headers\"",
        "\"error_message\"",
        "\"original_record\"",
    ]
    .iter()
    .map(|key| line.find(key).expect("key present"))
    .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "field order changed: {line}");

    let value: serde_json::Value = serde_json::from_str(&line)?;
    assert_eq!(value["timestamp"], "2024-01-02T03:04:05Z");
    assert_eq!(value["response_headers"]["Retry-After"][0], "5");
    assert_eq!(value["original_record"]["key"], "order-42");
    assert_eq!(value["original_record"]["payload_before"], r#"{"order":41}"#);
    assert_eq!(value["original_record"]["metadata"]["source"], "orders");

    let reparsed: ResponseRecord = serde_json::from_value(value)?;
    assert_eq!(reparsed, persisted);
    Ok(())
}

#[test]
fn transport_failure_record_has_no_http_fields() -> anyhow::Result<()> {
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().expect("valid timestamp");
    let persisted = ResponseRecord::new("abc", at).with_error("Transport error: connection refused");

    let line = serde_json::to_string(&persisted)?;
    assert_eq!(
        line,
        r#"{"correlation_id":"abc","timestamp":"2024-01-02T03:04:05Z","error_message":"Transport error: connection refused"}"#
    );
    Ok(())
}
