//! Authentication strategies

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use courier_common::auth::{TokenCache, TokenSource};
use courier_domain::constants::TOKEN_EXPIRY_SAFETY_MARGIN;
use courier_domain::{AuthConfig, CourierError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use super::client_credentials::ClientCredentialsSource;

/// How outgoing requests are authenticated.
///
/// Static credentials are encoded once at construction. The OAuth2 variant
/// holds a token cache shared by every clone of the strategy, so all
/// requests of one destination reuse a single token.
#[derive(Clone)]
pub enum AuthStrategy {
    None,
    Basic(HeaderValue),
    Bearer(HeaderValue),
    OAuth2(Arc<TokenCache<Arc<dyn TokenSource>>>),
}

impl AuthStrategy {
    /// Build the strategy selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Configuration`] if a required credential is
    /// empty or the token URL does not parse.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        match config {
            AuthConfig::None => Ok(Self::None),
            AuthConfig::Basic { username, password } => Self::basic(username, password),
            AuthConfig::Bearer { token } => Self::bearer(token),
            AuthConfig::OAuth2 { client_id, client_secret, token_url, scopes } => {
                if client_id.is_empty() || client_secret.is_empty() || token_url.is_empty() {
                    return Err(CourierError::config(
                        "oauth2 auth requires clientId, clientSecret, and tokenUrl",
                    ));
                }
                let source = ClientCredentialsSource::new(
                    client_id.as_str(),
                    client_secret.as_str(),
                    token_url,
                    scopes.clone(),
                )?;
                Ok(Self::oauth2(Arc::new(source)))
            }
        }
    }

    /// # Errors
    ///
    /// Fails if either part is empty or not a valid header value.
    pub fn basic(username: &str, password: &str) -> Result<Self> {
        if username.is_empty() || password.is_empty() {
            return Err(CourierError::config("basic auth requires username and password"));
        }
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        Ok(Self::Basic(sensitive(&format!("Basic {encoded}"))?))
    }

    /// # Errors
    ///
    /// Fails if the token is empty or not a valid header value.
    pub fn bearer(token: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(CourierError::config("bearer auth requires a token"));
        }
        Ok(Self::Bearer(sensitive(&format!("Bearer {token}"))?))
    }

    /// OAuth2 strategy over any token source, with the standard safety margin.
    pub fn oauth2(source: Arc<dyn TokenSource>) -> Self {
        Self::OAuth2(Arc::new(TokenCache::new(source, TOKEN_EXPIRY_SAFETY_MARGIN)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic(_) => "basic",
            Self::Bearer(_) => "bearer",
            Self::OAuth2(_) => "oauth2",
        }
    }

    /// Set `Authorization` on `headers`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Authentication`] if an OAuth2 token cannot be
    /// obtained.
    pub async fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        let value = match self {
            Self::None => return Ok(()),
            Self::Basic(value) | Self::Bearer(value) => value.clone(),
            Self::OAuth2(cache) => {
                let token = cache
                    .token()
                    .await
                    .map_err(|e| CourierError::Authentication(e.to_string()))?;
                sensitive(&format!("Bearer {}", token.secret())).map_err(|_| {
                    CourierError::Authentication("token is not a valid header value".into())
                })?
            }
        };
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

impl std::fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AuthStrategy").field(&self.kind()).finish()
    }
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| CourierError::config("credentials contain invalid header characters"))?;
    header.set_sensitive(true);
    Ok(header)
}
