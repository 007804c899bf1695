//! Sleeping that can be interrupted by a cancellation token

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Returned when a wait was cut short by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("wait cancelled")]
pub struct Cancelled;

/// Sleep for `duration` unless `cancel` fires first.
///
/// Returns immediately with [`Cancelled`] if the token is already cancelled.
///
/// # Errors
///
/// Returns [`Cancelled`] when the token is cancelled before the sleep ends.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> Result<(), Cancelled> {
    if cancel.is_cancelled() {
        return Err(Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}
