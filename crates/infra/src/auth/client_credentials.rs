//! OAuth2 client-credentials token source

use std::fmt;

use async_trait::async_trait;
use courier_common::auth::{AccessToken, TokenError, TokenSource};
use courier_domain::constants::TOKEN_REQUEST_TIMEOUT;
use courier_domain::{CourierError, Result};
use oauth2::basic::BasicClient;
use oauth2::{
    ClientId, ClientSecret, EndpointNotSet, EndpointSet, RequestTokenError, Scope, TokenResponse,
    TokenUrl,
};
use tracing::debug;

use crate::errors::InfraError;

type CredentialsClient =
    BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Mints tokens with the client-credentials grant.
///
/// Each call to [`TokenSource::fetch_token`] is exactly one POST to the token
/// endpoint; caching and single-flight renewal are the token cache's job.
pub struct ClientCredentialsSource {
    client: CredentialsClient,
    scopes: Vec<String>,
    http: reqwest::Client,
    token_url: String,
}

impl ClientCredentialsSource {
    /// # Errors
    ///
    /// Returns [`CourierError::Configuration`] if the token URL does not parse
    /// or the HTTP client cannot be built.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: &str,
        scopes: Vec<String>,
    ) -> Result<Self> {
        let token_uri = TokenUrl::new(token_url.to_string())
            .map_err(|e| CourierError::config(format!("auth.tokenUrl is not a valid URL: {e}")))?;

        let client = BasicClient::new(ClientId::new(client_id.into()))
            .set_client_secret(ClientSecret::new(client_secret.into()))
            .set_token_uri(token_uri);

        // Following redirects from a token endpoint could leak credentials.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()
            .map_err(InfraError::from)?;

        Ok(Self { client, scopes, http, token_url: token_url.to_string() })
    }
}

#[async_trait]
impl TokenSource for ClientCredentialsSource {
    async fn fetch_token(&self) -> std::result::Result<AccessToken, TokenError> {
        debug!(token_url = %self.token_url, scopes = ?self.scopes, "requesting client-credentials token");

        let mut request = self.client.exchange_client_credentials();
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }

        let response = request.request_async(&self.http).await.map_err(|e| match e {
            RequestTokenError::ServerResponse(body) => TokenError::Rejected(body.to_string()),
            RequestTokenError::Request(e) => TokenError::Request(e.to_string()),
            RequestTokenError::Parse(e, _) => TokenError::InvalidResponse(e.to_string()),
            RequestTokenError::Other(message) => TokenError::InvalidResponse(message),
        })?;

        let secret = response.access_token().secret().clone();
        Ok(match response.expires_in() {
            Some(lifetime) => AccessToken::expiring_in(secret, lifetime),
            None => AccessToken::new(secret),
        })
    }
}

impl fmt::Debug for ClientCredentialsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsSource")
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}
