//! Application constants
//!
//! Defaults mirror the option defaults documented for the HTTP destination.

use std::time::Duration;

/// Connector name reported to the hosting runtime.
pub const CONNECTOR_NAME: &str = "http";
pub const CONNECTOR_VERSION: &str = "v0.1.0";

/// Metadata key consulted first when deriving a correlation ID.
pub const CORRELATION_ID_METADATA_KEY: &str = "correlation_id";

// HTTP defaults
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_IDLE_CONNS: usize = 100;
pub const DEFAULT_MAX_CONNS_PER_HOST: usize = 10;
pub const IDLE_CONN_TIMEOUT: Duration = Duration::from_secs(90);
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_ENV_HEADER_PREFIX: &str = "HTTP_HEADER_";

// Retry defaults
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Upper bound accepted for `retry.maxRetries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(30);

/// A cached OAuth2 token is renewed once it expires within this window.
pub const TOKEN_EXPIRY_SAFETY_MARGIN: Duration = Duration::from_secs(10);
/// Upper bound on one token-endpoint request.
pub const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Sink defaults
pub const DEFAULT_SUCCESS_FILE: &str = "responses/success.ndjson";
pub const DEFAULT_ERROR_FILE: &str = "responses/errors.ndjson";
