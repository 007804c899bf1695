//! Resilience primitives for delivery retries
//!
//! - **Backoff**: capped exponential delay schedule
//! - **Delay**: a sleep that gives way to a cancellation token
//!
//! The retry decision itself (what is retryable) is delivery-specific and
//! lives in `courier-core`; this module only knows about time.

pub mod backoff;
pub mod delay;

pub use backoff::ExponentialBackoff;
pub use delay::{sleep_or_cancel, Cancelled};
