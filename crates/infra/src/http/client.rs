use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_core::RequestSender;
use courier_domain::constants::{
    DEFAULT_CONTENT_TYPE, DEFAULT_MAX_CONNS_PER_HOST, DEFAULT_MAX_IDLE_CONNS, DEFAULT_TIMEOUT,
    IDLE_CONN_TIMEOUT,
};
use courier_domain::{CourierError, DeliveryResponse, DestinationConfig, HttpMethod, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, Url};
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::auth::AuthStrategy;
use crate::errors::InfraError;

/// Sends one record body to the destination URL per call.
///
/// Every HTTP status comes back as a [`DeliveryResponse`]; only transport,
/// authentication and request-construction failures are errors. At most
/// `max_conns_per_host` attempts are in flight at once. The per-attempt
/// timeout covers token acquisition, waiting for a connection permit, the
/// request and the body read.
#[derive(Clone)]
pub struct DeliveryClient {
    client: ReqwestClient,
    url: Url,
    method: Method,
    headers: HeaderMap,
    auth: AuthStrategy,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl DeliveryClient {
    /// Start building a client for `url`.
    pub fn builder(url: impl Into<String>) -> DeliveryClientBuilder {
        DeliveryClientBuilder::new(url)
    }

    /// Client configured from a destination config.
    ///
    /// `env_headers` are layered over the configured static headers.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Configuration`] for an invalid URL or header.
    pub fn from_config(
        config: &DestinationConfig,
        env_headers: BTreeMap<String, String>,
        auth: AuthStrategy,
    ) -> Result<Self> {
        Self::builder(config.url.clone())
            .method(config.method)
            .timeout(config.timeout)
            .max_idle_conns(config.max_idle_conns)
            .max_conns_per_host(config.max_conns_per_host)
            .static_headers(config.static_headers.clone())
            .env_headers(env_headers)
            .auth(auth)
            .build()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Headers sent with every request, before authentication.
    pub fn base_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Number of attempts that could start right now without waiting.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl RequestSender for DeliveryClient {
    #[instrument(level = "debug", skip_all, fields(method = %self.method, url = %self.url))]
    async fn send(&self, body: &[u8]) -> Result<DeliveryResponse> {
        match tokio::time::timeout(self.timeout, self.attempt(body)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.timeout, "attempt timed out");
                Err(CourierError::Transport(format!(
                    "attempt timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

impl DeliveryClient {
    /// One attempt: authentication, a connection permit, the request and the
    /// full response body. [`RequestSender::send`] bounds all of it by the
    /// per-attempt timeout.
    async fn attempt(&self, body: &[u8]) -> Result<DeliveryResponse> {
        let mut headers = self.headers.clone();
        self.auth.apply(&mut headers).await?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CourierError::Internal("connection limiter closed".to_string()))?;

        debug!(bytes = body.len(), "sending request");
        let response = self
            .client
            .request(self.method.clone(), self.url.clone())
            .headers(headers)
            .body(body.to_vec())
            .send()
            .await
            .map_err(InfraError::from)?;

        let status = response.status();
        let mut delivered = DeliveryResponse::new(status.as_u16());
        for (name, value) in response.headers() {
            delivered =
                delivered.with_header(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }

        // Read the whole body while holding the permit so the connection is
        // back in the pool before the next attempt starts.
        let bytes = response.bytes().await.map_err(InfraError::from)?;
        let delivered = delivered.with_body(bytes.to_vec());

        if status.is_success() {
            debug!(status = status.as_u16(), "received response");
        } else {
            warn!(status = status.as_u16(), "received non-success response");
        }
        Ok(delivered)
    }
}

impl std::fmt::Debug for DeliveryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryClient")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

/// Builder for [`DeliveryClient`].
#[derive(Debug)]
pub struct DeliveryClientBuilder {
    url: String,
    method: HttpMethod,
    timeout: Duration,
    max_idle_conns: usize,
    max_conns_per_host: usize,
    static_headers: BTreeMap<String, String>,
    env_headers: BTreeMap<String, String>,
    auth: AuthStrategy,
}

impl DeliveryClientBuilder {
    fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            timeout: DEFAULT_TIMEOUT,
            max_idle_conns: DEFAULT_MAX_IDLE_CONNS,
            max_conns_per_host: DEFAULT_MAX_CONNS_PER_HOST,
            static_headers: BTreeMap::new(),
            env_headers: BTreeMap::new(),
            auth: AuthStrategy::None,
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Per-attempt timeout, body read included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Idle connections kept in the pool.
    ///
    /// reqwest only bounds idle connections per host. A client talks to the
    /// single destination host, so the per-host bound is the overall bound.
    pub fn max_idle_conns(mut self, max: usize) -> Self {
        self.max_idle_conns = max;
        self
    }

    pub fn max_conns_per_host(mut self, max: usize) -> Self {
        self.max_conns_per_host = max;
        self
    }

    pub fn static_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.static_headers = headers;
        self
    }

    /// Headers derived from the environment; they win over static headers.
    pub fn env_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.env_headers = headers;
        self
    }

    pub fn auth(mut self, auth: AuthStrategy) -> Self {
        self.auth = auth;
        self
    }

    /// # Errors
    ///
    /// Returns [`CourierError::Configuration`] if the URL, a header or the
    /// connection limits are invalid.
    pub fn build(self) -> Result<DeliveryClient> {
        let url = Url::parse(&self.url).map_err(InfraError::from)?;
        if self.max_conns_per_host == 0 {
            return Err(CourierError::config("maxConnsPerHost must be greater than zero"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        for (name, value) in self.static_headers.iter().chain(self.env_headers.iter()) {
            let (name, value) = header_pair(name, value)?;
            headers.insert(name, value);
        }

        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(self.max_idle_conns)
            .pool_idle_timeout(IDLE_CONN_TIMEOUT)
            .build()
            .map_err(InfraError::from)?;

        let method = match self.method {
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
        };

        Ok(DeliveryClient {
            client,
            url,
            method,
            headers,
            auth: self.auth,
            timeout: self.timeout,
            permits: Arc::new(Semaphore::new(self.max_conns_per_host)),
        })
    }
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| CourierError::config(format!("invalid header name: {name}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|_| CourierError::config(format!("invalid value for header {name}")))?;
    Ok((header_name, header_value))
}
