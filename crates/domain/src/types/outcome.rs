//! Terminal outcome of one delivery sequence.

use super::response::DeliveryResponse;
use crate::errors::CourierError;

/// How a record's delivery ended.
///
/// Produced once per record by the retry engine after it reaches a terminal
/// state. Failure variants keep the last response (if the server answered)
/// so the error sink can record its status, body and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// A 2xx response.
    Success { response: DeliveryResponse, attempts: u32 },

    /// The failure was classified as non-retryable.
    PermanentFailure { response: Option<DeliveryResponse>, cause: CourierError, attempts: u32 },

    /// Every permitted attempt failed with a retryable condition.
    ExhaustedRetries {
        last_response: Option<DeliveryResponse>,
        last_cause: CourierError,
        attempts: u32,
    },

    /// The surrounding operation was cancelled before a terminal state.
    Cancelled { last_response: Option<DeliveryResponse>, attempts: u32 },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Number of delivery attempts made, including the first.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. }
            | Self::PermanentFailure { attempts, .. }
            | Self::ExhaustedRetries { attempts, .. }
            | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// The last response received, if any.
    pub fn response(&self) -> Option<&DeliveryResponse> {
        match self {
            Self::Success { response, .. } => Some(response),
            Self::PermanentFailure { response, .. } => response.as_ref(),
            Self::ExhaustedRetries { last_response, .. } | Self::Cancelled { last_response, .. } => {
                last_response.as_ref()
            }
        }
    }

    /// The error to surface to the batch caller; `None` on success.
    pub fn error(&self) -> Option<CourierError> {
        match self {
            Self::Success { .. } => None,
            Self::PermanentFailure { cause, .. } => Some(cause.clone()),
            Self::ExhaustedRetries { last_cause, .. } => Some(last_cause.clone()),
            Self::Cancelled { .. } => Some(CourierError::Cancelled),
        }
    }
}
