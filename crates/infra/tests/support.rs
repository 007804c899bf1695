//! Shared helpers for destination integration tests.

use std::path::PathBuf;
use std::time::Duration;

use courier_domain::{
    DestinationConfig, DestinationConfigBuilder, InputRecord, RetrySettings, SinkConfig,
};
use serde_json::Value;
use tempfile::TempDir;

/// Retry settings with millisecond backoff so real-time tests stay fast.
pub fn fast_retry(max_retries: u32) -> RetrySettings {
    RetrySettings {
        max_retries,
        backoff_base: Duration::from_millis(10),
        backoff_max: Duration::from_millis(40),
        ..RetrySettings::default()
    }
}

/// Success and error NDJSON files inside a temporary directory.
pub struct TestSinks {
    dir: TempDir,
}

impl TestSinks {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().expect("temp dir should be created") }
    }

    pub fn success_path(&self) -> PathBuf {
        self.dir.path().join("responses/success.ndjson")
    }

    pub fn error_path(&self) -> PathBuf {
        self.dir.path().join("responses/errors.ndjson")
    }

    pub fn success_lines(&self) -> Vec<Value> {
        read_lines(&self.success_path())
    }

    pub fn error_lines(&self) -> Vec<Value> {
        read_lines(&self.error_path())
    }

    /// Builder for a destination posting to `url` with these sinks.
    pub fn config(&self, url: impl Into<String>) -> DestinationConfigBuilder {
        DestinationConfig::builder(url)
            .success_sink(SinkConfig::file(self.success_path()))
            .error_sink(SinkConfig::file(self.error_path()))
            .retry(fast_retry(3))
    }
}

impl Default for TestSinks {
    fn default() -> Self {
        Self::new()
    }
}

fn read_lines(path: &std::path::Path) -> Vec<Value> {
    let contents = std::fs::read_to_string(path).unwrap_or_default();
    contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("every line is a JSON object"))
        .collect()
}

/// Record with an `{"id": ...}` payload whose position is `id`.
pub fn record(id: &str) -> InputRecord {
    InputRecord::new(format!(r#"{{"id":"{id}"}}"#)).with_position(id)
}
