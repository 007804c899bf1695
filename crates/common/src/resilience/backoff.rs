//! Capped exponential backoff

use std::time::Duration;

/// Exponential backoff: `delay(n) = min(cap, base * 2^n)`.
///
/// No jitter is applied, so delays are deterministic and testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base: Duration,
    cap: Duration,
}

impl ExponentialBackoff {
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    pub const fn base(&self) -> Duration {
        self.base
    }

    pub const fn cap(&self) -> Duration {
        self.cap
    }

    /// Delay before retry number `n` (the first retry waits `delay(1)`).
    ///
    /// Saturates at the cap instead of overflowing for large `n`.
    pub fn delay(&self, n: u32) -> Duration {
        2u32.checked_pow(n)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.cap, |delay| delay.min(self.cap))
    }
}
