//! Mock implementations of common traits
//!
//! Provides mock token sources for exercising the token cache and the
//! strategies built on it.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{AccessToken, TokenError, TokenSource};

/// Token source that counts its calls and mints `token-<n>` for call `n`.
///
/// # Examples
///
/// ```
/// use courier_common::auth::TokenSource;
/// use courier_common::testing::mocks::CountingTokenSource;
///
/// # tokio_test::block_on(async {
/// let source = CountingTokenSource::new();
/// assert_eq!(source.fetch_token().await.unwrap().secret(), "token-1");
/// assert_eq!(source.calls(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct CountingTokenSource {
    calls: AtomicUsize,
    failures_remaining: AtomicUsize,
    lifetime: Option<Duration>,
    delay: Duration,
}

impl CountingTokenSource {
    /// Source minting tokens that never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint tokens valid for `lifetime`.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// Sleep for `delay` inside every fetch, so concurrent callers overlap.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reject the first `count` fetches.
    #[must_use]
    pub fn failing_first(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Number of fetches so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for CountingTokenSource {
    async fn fetch_token(&self) -> Result<AccessToken, TokenError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TokenError::Rejected(format!("call {n} rejected")));
        }

        let secret = format!("token-{n}");
        Ok(match self.lifetime {
            Some(lifetime) => AccessToken::expiring_in(secret, lifetime),
            None => AccessToken::new(secret),
        })
    }
}
