//! Destination configuration
//!
//! `DestinationConfig` is what the host hands to `open`. Keys are camelCase,
//! every field except `url` has a default, and durations use the
//! [`human_duration`](crate::utils::duration::human_duration) format.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX, DEFAULT_ENV_HEADER_PREFIX, DEFAULT_ERROR_FILE,
    DEFAULT_MAX_CONNS_PER_HOST, DEFAULT_MAX_IDLE_CONNS, DEFAULT_MAX_RETRIES, DEFAULT_SUCCESS_FILE,
    DEFAULT_TIMEOUT, MAX_RETRIES_LIMIT,
};
use crate::errors::{CourierError, Result};
use crate::impl_enum_str_conversions;
use crate::utils::duration::human_duration;

/// HTTP methods a record can be delivered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    #[default]
    Post,
    Put,
    Patch,
}

impl_enum_str_conversions!(HttpMethod {
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
});

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse::<Self>().map_err(|_| {
            format!("invalid method: {value} (must be POST, PUT, or PATCH)")
        })
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.to_string()
    }
}

/// Authentication settings, selected by `type`.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum AuthConfig {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
    #[serde(rename = "oauth2")]
    OAuth2 {
        client_id: String,
        client_secret: String,
        token_url: String,
        #[serde(default, deserialize_with = "scopes_from_list_or_csv")]
        scopes: Vec<String>,
    },
}

impl AuthConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic { .. } => "basic",
            Self::Bearer { .. } => "bearer",
            Self::OAuth2 { .. } => "oauth2",
        }
    }
}

// Credentials must never reach logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"<redacted>").finish(),
            Self::OAuth2 { client_id, token_url, scopes, .. } => f
                .debug_struct("OAuth2")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .field("token_url", token_url)
                .field("scopes", scopes)
                .finish(),
        }
    }
}

fn scopes_from_list_or_csv<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Csv(String),
    }

    let scopes = match Raw::deserialize(deserializer)? {
        Raw::List(list) => list,
        Raw::Csv(csv) => csv.split(',').map(str::to_string).collect(),
    };
    Ok(scopes.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}

/// Retry and backoff settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrySettings {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: u32,

    #[serde(with = "human_duration")]
    pub backoff_base: Duration,

    #[serde(with = "human_duration")]
    pub backoff_max: Duration,

    pub retry_on_5xx: bool,
    pub retry_on_429: bool,
    pub retry_on_network_err: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_max: DEFAULT_BACKOFF_MAX,
            retry_on_5xx: true,
            retry_on_429: true,
            retry_on_network_err: true,
        }
    }
}

/// Where response records of one kind are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Append NDJSON lines to a local file.
    File { path: PathBuf },
    /// Publish to a message broker topic through a host-supplied publisher.
    Broker { topic: String },
}

impl SinkConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn broker(topic: impl Into<String>) -> Self {
        Self::Broker { topic: topic.into() }
    }
}

/// Full configuration of an HTTP destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DestinationConfig {
    pub url: String,
    pub method: HttpMethod,

    /// Per-attempt timeout.
    #[serde(with = "human_duration")]
    pub timeout: Duration,

    pub max_idle_conns: usize,
    pub max_conns_per_host: usize,

    pub auth: AuthConfig,

    pub static_headers: BTreeMap<String, String>,
    pub env_header_prefix: String,

    /// Prefer the after-payload as request body; fall back to the
    /// before-payload when unset or absent.
    pub use_payload_after: bool,

    pub retry: RetrySettings,

    pub success_sink: SinkConfig,
    pub error_sink: SinkConfig,

    pub include_response_headers: bool,
    pub include_request_metadata: bool,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: HttpMethod::default(),
            timeout: DEFAULT_TIMEOUT,
            max_idle_conns: DEFAULT_MAX_IDLE_CONNS,
            max_conns_per_host: DEFAULT_MAX_CONNS_PER_HOST,
            auth: AuthConfig::default(),
            static_headers: BTreeMap::new(),
            env_header_prefix: DEFAULT_ENV_HEADER_PREFIX.to_string(),
            use_payload_after: true,
            retry: RetrySettings::default(),
            success_sink: SinkConfig::file(DEFAULT_SUCCESS_FILE),
            error_sink: SinkConfig::file(DEFAULT_ERROR_FILE),
            include_response_headers: true,
            include_request_metadata: false,
        }
    }
}

impl DestinationConfig {
    /// Default configuration targeting `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    pub fn builder(url: impl Into<String>) -> DestinationConfigBuilder {
        DestinationConfigBuilder { config: Self::new(url) }
    }

    /// Check every field, returning the first problem found.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Configuration`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(CourierError::config("url is required"));
        }
        check_http_url("url", &self.url)?;

        if self.timeout.is_zero() {
            return Err(CourierError::config("timeout must be greater than zero"));
        }
        if self.max_conns_per_host == 0 {
            return Err(CourierError::config("maxConnsPerHost must be greater than zero"));
        }

        match &self.auth {
            AuthConfig::None => {}
            AuthConfig::Basic { username, password } => {
                if username.is_empty() || password.is_empty() {
                    return Err(CourierError::config(
                        "auth.username and auth.password are required for basic auth",
                    ));
                }
            }
            AuthConfig::Bearer { token } => {
                if token.is_empty() {
                    return Err(CourierError::config("auth.token is required for bearer auth"));
                }
            }
            AuthConfig::OAuth2 { client_id, client_secret, token_url, .. } => {
                if client_id.is_empty() || client_secret.is_empty() || token_url.is_empty() {
                    return Err(CourierError::config(
                        "auth.clientId, auth.clientSecret, and auth.tokenUrl are required for \
                         oauth2 auth",
                    ));
                }
                check_http_url("auth.tokenUrl", token_url)?;
            }
        }

        if self.retry.max_retries > MAX_RETRIES_LIMIT {
            return Err(CourierError::config(format!(
                "retry.maxRetries must be between 0 and {MAX_RETRIES_LIMIT}"
            )));
        }
        if self.retry.backoff_base.is_zero() {
            return Err(CourierError::config("retry.backoffBase must be greater than zero"));
        }
        if self.retry.backoff_max < self.retry.backoff_base {
            return Err(CourierError::config(
                "retry.backoffMax must not be less than retry.backoffBase",
            ));
        }

        check_sink("successSink", &self.success_sink)?;
        check_sink("errorSink", &self.error_sink)?;
        Ok(())
    }
}

fn check_http_url(key: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| CourierError::config(format!("{key} is not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CourierError::config(format!("{key} must use http or https, got {other}"))),
    }
}

fn check_sink(key: &str, sink: &SinkConfig) -> Result<()> {
    match sink {
        SinkConfig::File { path } if path.as_os_str().is_empty() => {
            Err(CourierError::config(format!("{key}.path must not be empty")))
        }
        SinkConfig::Broker { topic } if topic.trim().is_empty() => {
            Err(CourierError::config(format!("{key}.topic must not be empty")))
        }
        _ => Ok(()),
    }
}

/// Fluent builder for [`DestinationConfig`].
#[derive(Debug, Clone)]
pub struct DestinationConfigBuilder {
    config: DestinationConfig,
}

impl DestinationConfigBuilder {
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.config.method = method;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_conns_per_host(mut self, max: usize) -> Self {
        self.config.max_conns_per_host = max;
        self
    }

    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    pub fn static_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.static_headers.insert(name.into(), value.into());
        self
    }

    pub fn env_header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.env_header_prefix = prefix.into();
        self
    }

    pub fn use_payload_after(mut self, enabled: bool) -> Self {
        self.config.use_payload_after = enabled;
        self
    }

    pub fn retry(mut self, retry: RetrySettings) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn success_sink(mut self, sink: SinkConfig) -> Self {
        self.config.success_sink = sink;
        self
    }

    pub fn error_sink(mut self, sink: SinkConfig) -> Self {
        self.config.error_sink = sink;
        self
    }

    pub fn include_response_headers(mut self, enabled: bool) -> Self {
        self.config.include_response_headers = enabled;
        self
    }

    pub fn include_request_metadata(mut self, enabled: bool) -> Self {
        self.config.include_request_metadata = enabled;
        self
    }

    pub fn build(self) -> DestinationConfig {
        self.config
    }
}
