//! Access tokens held by the token cache

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// A bearer access token with an optional absolute expiry.
///
/// Expiry is tracked on the tokio clock so paused-time tests can move a
/// token past its deadline. A token without an expiry never expires.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    /// Token that never expires.
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into(), expires_at: None }
    }

    /// Token valid for `lifetime` from now.
    pub fn expiring_in(secret: impl Into<String>, lifetime: Duration) -> Self {
        Self { secret: secret.into(), expires_at: Some(Instant::now() + lifetime) }
    }

    /// Token with an explicit deadline.
    pub fn expiring_at(secret: impl Into<String>, expires_at: Instant) -> Self {
        Self { secret: secret.into(), expires_at: Some(expires_at) }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Whether the token expires at or before `now + margin`.
    pub fn expires_within(&self, margin: Duration) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now() + margin)
    }

    /// Time left before expiry, `None` if the token never expires.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at.map(|at| at.saturating_duration_since(Instant::now()))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("remaining", &self.remaining())
            .finish()
    }
}
