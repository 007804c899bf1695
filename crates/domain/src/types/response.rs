//! HTTP responses and the response records persisted or published downstream.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A fully buffered HTTP response from one delivery attempt.
///
/// Header names are stored in canonical form (`Content-Type`), values in the
/// order the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status: u16,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: Vec<u8>,
}

impl DeliveryResponse {
    pub fn new(status: u16) -> Self {
        Self { status, ..Default::default() }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Append a header value, canonicalizing the name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.entry(canonical_header_name(name)).or_default().push(value.into());
        self
    }

    /// Status in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// First value of a header, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}

/// Canonical MIME header form: first letter and every letter after a hyphen
/// upper-cased, everything else lower-cased (`x-request-id` → `X-Request-Id`).
pub fn canonical_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for ch in name.chars() {
        if upper {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        upper = ch == '-';
    }
    out
}

/// A response header value: a single string (broker messages) or every value
/// the server sent (file records).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    One(String),
    Many(Vec<String>),
}

impl HeaderValue {
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.first().map(String::as_str),
        }
    }
}

/// The record written to a success or error sink for one delivery.
///
/// Field order and names form the persisted layout; absent optional fields
/// are omitted from the JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub correlation_id: String,

    /// RFC 3339, UTC, second precision.
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<BTreeMap<String, HeaderValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_record: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ResponseRecord {
    pub fn new(correlation_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            http_status: None,
            response_body: None,
            response_headers: None,
            error_message: None,
            original_record: None,
        }
    }

    /// Copy status and body from `response`, and its headers when
    /// `include_headers` is set.
    pub fn with_response(mut self, response: &DeliveryResponse, include_headers: bool) -> Self {
        self.http_status = Some(response.status);
        self.response_body = Some(response.body_text());
        if include_headers {
            let headers = response
                .headers
                .iter()
                .map(|(name, values)| (name.clone(), HeaderValue::Many(values.clone())))
                .collect();
            self.response_headers = Some(headers);
        }
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_original_record(
        mut self,
        snapshot: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.original_record = Some(snapshot);
        self
    }

    /// Collapse multi-valued headers to their first value.
    pub fn with_flattened_headers(mut self) -> Self {
        if let Some(headers) = self.response_headers.take() {
            let flat = headers
                .into_iter()
                .filter_map(|(name, value)| {
                    value.first().map(|first| (name, HeaderValue::One(first.to_string())))
                })
                .collect();
            self.response_headers = Some(flat);
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }
}
