//! Expiry-aware token cache with single-flight renewal
//!
//! Callers share one cached token. Once a valid token is cached, reads take
//! only the shared side of an `RwLock`. When the token is missing or expires
//! within the safety margin, callers queue on a renewal mutex; the first one
//! in fetches, and everyone behind it re-checks the cache after acquiring the
//! mutex and reuses the fresh token instead of fetching again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::token::AccessToken;
use super::traits::{TokenError, TokenSource};

/// Token cache wrapping a [`TokenSource`].
pub struct TokenCache<S> {
    source: S,
    current: RwLock<Option<AccessToken>>,
    renewal: Mutex<()>,
    safety_margin: Duration,
    renewals: AtomicU64,
}

impl<S: TokenSource> TokenCache<S> {
    /// Create an empty cache.
    ///
    /// # Arguments
    /// * `source` - where fresh tokens come from
    /// * `safety_margin` - a cached token expiring within this window is
    ///   treated as expired
    pub fn new(source: S, safety_margin: Duration) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            renewal: Mutex::new(()),
            safety_margin,
            renewals: AtomicU64::new(0),
        }
    }

    /// Return a usable token, renewing it first if needed.
    ///
    /// At most one renewal is in flight per cache. A failed renewal leaves the
    /// previously cached token (if any) in place so a later call can retry.
    ///
    /// # Errors
    ///
    /// Returns the [`TokenError`] from the source when renewal fails.
    pub async fn token(&self) -> Result<AccessToken, TokenError> {
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        let _renewal = self.renewal.lock().await;

        // Another caller may have renewed while we waited.
        if let Some(token) = self.cached().await {
            debug!("reusing token renewed by a concurrent caller");
            return Ok(token);
        }

        let fresh = match self.source.fetch_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "token renewal failed");
                return Err(e);
            }
        };

        *self.current.write().await = Some(fresh.clone());
        let renewals = self.renewals.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            renewals,
            expires_in_secs = fresh.remaining().map(|d| d.as_secs()),
            "access token renewed"
        );
        Ok(fresh)
    }

    /// Number of successful renewals so far.
    pub fn renewals(&self) -> u64 {
        self.renewals.load(Ordering::Relaxed)
    }

    /// Drop the cached token so the next call renews.
    pub async fn clear(&self) {
        *self.current.write().await = None;
    }

    async fn cached(&self) -> Option<AccessToken> {
        let guard = self.current.read().await;
        guard.as_ref().filter(|token| !token.expires_within(self.safety_margin)).cloned()
    }
}

impl<S> std::fmt::Debug for TokenCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("safety_margin", &self.safety_margin)
            .field("renewals", &self.renewals.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join_all;

    use super::*;
    use crate::testing::mocks::CountingTokenSource;

    const MARGIN: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_renewal() {
        let source = Arc::new(
            CountingTokenSource::new()
                .with_lifetime(Duration::from_secs(3600))
                .with_delay(Duration::from_millis(50)),
        );
        let cache = TokenCache::new(Arc::clone(&source), MARGIN);

        let tokens = join_all((0..16).map(|_| cache.token())).await;

        assert_eq!(source.calls(), 1);
        let secrets: Vec<String> =
            tokens.into_iter().map(|t| t.unwrap().secret().to_string()).collect();
        assert!(secrets.iter().all(|s| s == "token-1"));
        assert_eq!(cache.renewals(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_share_one_renewal() {
        let source = Arc::new(
            CountingTokenSource::new()
                .with_lifetime(Duration::from_secs(3600))
                .with_delay(Duration::from_millis(25)),
        );
        let cache = Arc::new(TokenCache::new(Arc::clone(&source), MARGIN));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.token().await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().secret(), "token-1");
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn token_inside_safety_margin_is_renewed_once() {
        let source =
            Arc::new(CountingTokenSource::new().with_lifetime(Duration::from_secs(60)));
        let cache = TokenCache::new(Arc::clone(&source), MARGIN);

        assert_eq!(cache.token().await.unwrap().secret(), "token-1");
        tokio::time::advance(Duration::from_secs(55)).await;

        assert_eq!(cache.token().await.unwrap().secret(), "token-2");
        assert_eq!(cache.token().await.unwrap().secret(), "token-2");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn far_future_token_is_not_renewed() {
        let source =
            Arc::new(CountingTokenSource::new().with_lifetime(Duration::from_secs(3600)));
        let cache = TokenCache::new(Arc::clone(&source), MARGIN);

        cache.token().await.unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        cache.token().await.unwrap();

        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn token_without_expiry_is_fetched_once() {
        let source = Arc::new(CountingTokenSource::new());
        let cache = TokenCache::new(Arc::clone(&source), MARGIN);

        for _ in 0..5 {
            cache.token().await.unwrap();
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_renewal_keeps_previous_state() {
        let source = Arc::new(CountingTokenSource::new().failing_first(1));
        let cache = TokenCache::new(Arc::clone(&source), MARGIN);

        let err = cache.token().await.unwrap_err();
        assert!(matches!(err, TokenError::Rejected(_)));
        assert_eq!(cache.renewals(), 0);

        // The cache stayed empty, so the next call tries again.
        assert_eq!(cache.token().await.unwrap().secret(), "token-2");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn clear_forces_renewal() {
        let source = Arc::new(CountingTokenSource::new());
        let cache = TokenCache::new(Arc::clone(&source), MARGIN);

        cache.token().await.unwrap();
        cache.clear().await;
        assert_eq!(cache.token().await.unwrap().secret(), "token-2");
    }
}
