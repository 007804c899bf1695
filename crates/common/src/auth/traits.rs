//! Traits for token acquisition
//!
//! The token cache only knows how to ask for a fresh token. Talking to an
//! actual token endpoint lives behind this trait so the cache can be tested
//! with counting or failing sources.

use async_trait::async_trait;
use thiserror::Error;

use super::token::AccessToken;

/// Errors raised while obtaining a token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The token endpoint could not be reached.
    #[error("token request failed: {0}")]
    Request(String),

    /// The token endpoint answered with an error.
    #[error("token endpoint rejected the request: {0}")]
    Rejected(String),

    /// The token endpoint's answer could not be understood.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// Source of fresh access tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Request a new token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] when the endpoint is unreachable, rejects the
    /// credentials, or returns something that is not a token.
    async fn fetch_token(&self) -> Result<AccessToken, TokenError>;
}

#[async_trait]
impl<T: TokenSource + ?Sized> TokenSource for std::sync::Arc<T> {
    async fn fetch_token(&self) -> Result<AccessToken, TokenError> {
        (**self).fetch_token().await
    }
}
