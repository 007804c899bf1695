//! Upstream records handed to the destination by the hosting runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::impl_enum_str_conversions;

/// Change operation carried by a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Create,
    Update,
    Delete,
    Snapshot,
}

impl_enum_str_conversions!(Operation {
    Create => "create",
    Update => "update",
    Delete => "delete",
    Snapshot => "snapshot",
});

/// A record produced upstream.
///
/// The delivery engine reads the payload to build the request body and the
/// identity fields (`metadata`, `position`, `key`) to derive a correlation
/// ID. It never mutates a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec<u8>>,

    #[serde(default)]
    pub operation: Operation,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Vec<u8>>,

    /// Payload state before the change (set for updates and deletes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_before: Option<Vec<u8>>,

    /// Payload state after the change (absent for deletes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_after: Option<Vec<u8>>,
}

impl InputRecord {
    /// Create a record whose after-payload is `payload`.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self { payload_after: Some(payload.into()), ..Default::default() }
    }

    pub fn with_position(mut self, position: impl Into<Vec<u8>>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_payload_before(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload_before = Some(payload.into());
        self
    }

    /// Snapshot of the record as a JSON object with byte fields rendered as
    /// (lossy) UTF-8 strings. Used for `original_record` in response records.
    pub fn snapshot(&self) -> serde_json::Map<String, serde_json::Value> {
        use serde_json::Value;

        let mut map = serde_json::Map::new();
        let text = |bytes: &Vec<u8>| Value::String(String::from_utf8_lossy(bytes).into_owned());

        if let Some(position) = &self.position {
            map.insert("position".into(), text(position));
        }
        if let Some(key) = &self.key {
            map.insert("key".into(), text(key));
        }
        if let Some(before) = &self.payload_before {
            map.insert("payload_before".into(), text(before));
        }
        if let Some(after) = &self.payload_after {
            map.insert("payload_after".into(), text(after));
        }
        if !self.metadata.is_empty() {
            let metadata = self
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            map.insert("metadata".into(), Value::Object(metadata));
        }
        map
    }
}
