//! Retry engine for delivery attempts
//!
//! Drives an attempt function until it succeeds, fails in a way that must not
//! be retried, runs out of attempts, or is cancelled.
//!
//! | Condition | Retryable iff |
//! |---|---|
//! | transport error | `retry_on_transport_error` |
//! | 500..=599 | `retry_on_5xx` |
//! | 429 | `retry_on_429` |
//! | other 4xx, other non-2xx | never |
//! | authentication, configuration, payload errors | never |

use std::future::Future;
use std::time::Duration;

use courier_common::resilience::{sleep_or_cancel, ExponentialBackoff};
use courier_domain::{CourierError, DeliveryOutcome, DeliveryResponse, RetrySettings};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Immutable retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: ExponentialBackoff,
    pub retry_on_5xx: bool,
    pub retry_on_429: bool,
    pub retry_on_transport_error: bool,
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self { max_retries: 0, ..Self::from(&RetrySettings::default()) }
    }

    /// Delay before retry number `n`, counting from 1.
    pub fn backoff(&self, n: u32) -> Duration {
        self.backoff.delay(n)
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            backoff: ExponentialBackoff::new(settings.backoff_base, settings.backoff_max),
            retry_on_5xx: settings.retry_on_5xx,
            retry_on_429: settings.retry_on_429,
            retry_on_transport_error: settings.retry_on_network_err,
        }
    }
}

/// How one attempt's result is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Retryable,
    Permanent,
}

/// Classify an attempt result under `policy`.
pub fn classify(policy: &RetryPolicy, result: &Result<DeliveryResponse, CourierError>) -> Verdict {
    match result {
        Ok(response) if response.is_success() => Verdict::Success,
        Ok(response) => match response.status {
            500..=599 if policy.retry_on_5xx => Verdict::Retryable,
            429 if policy.retry_on_429 => Verdict::Retryable,
            _ => Verdict::Permanent,
        },
        Err(CourierError::Transport(_)) if policy.retry_on_transport_error => Verdict::Retryable,
        Err(_) => Verdict::Permanent,
    }
}

/// Executes attempts under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryEngine {
    policy: RetryPolicy,
}

impl RetryEngine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `attempt` until a terminal state.
    ///
    /// `attempt` receives the zero-based attempt number. Both the attempt
    /// itself and the backoff wait give way to `cancel`.
    pub async fn run<F, Fut>(&self, cancel: &CancellationToken, mut attempt: F) -> DeliveryOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<DeliveryResponse, CourierError>>,
    {
        let mut n = 0u32;
        let mut last_response = None;

        loop {
            if cancel.is_cancelled() {
                return DeliveryOutcome::Cancelled { last_response, attempts: n };
            }

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return DeliveryOutcome::Cancelled { last_response, attempts: n + 1 };
                }
                result = attempt(n) => result,
            };
            let attempts = n + 1;

            match (classify(&self.policy, &result), result) {
                (Verdict::Success, Ok(response)) => {
                    debug!(attempts, status = response.status, "delivery succeeded");
                    return DeliveryOutcome::Success { response, attempts };
                }
                (Verdict::Retryable, result) if n >= self.policy.max_retries => {
                    let (response, cause) = split(result);
                    let last = match &response {
                        Some(response) => format!("HTTP {}", response.status),
                        None => cause.to_string(),
                    };
                    warn!(attempts, last = %last, "retries exhausted");
                    return DeliveryOutcome::ExhaustedRetries {
                        last_response: response,
                        last_cause: CourierError::RetryExhausted {
                            max_retries: self.policy.max_retries,
                            last,
                        },
                        attempts,
                    };
                }
                (Verdict::Retryable, result) => {
                    let delay = self.policy.backoff(n + 1);
                    let (response, cause) = split(result);
                    warn!(
                        attempt = attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %cause,
                        "retrying delivery"
                    );
                    last_response = response;

                    if sleep_or_cancel(delay, cancel).await.is_err() {
                        debug!(attempts, "cancelled during backoff");
                        return DeliveryOutcome::Cancelled { last_response, attempts };
                    }
                    n += 1;
                }
                (_, result) => {
                    let (response, cause) = split(result);
                    debug!(attempts, error = %cause, "attempt failed permanently");
                    return DeliveryOutcome::PermanentFailure { response, cause, attempts };
                }
            }
        }
    }
}

/// Split a failed attempt into its response (if any) and a cause.
fn split(result: Result<DeliveryResponse, CourierError>) -> (Option<DeliveryResponse>, CourierError) {
    match result {
        Ok(response) => {
            let cause = CourierError::NonRetryableStatus { status: response.status };
            (Some(response), cause)
        }
        Err(cause) => (None, cause),
    }
}
