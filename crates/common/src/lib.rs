//! Modular common utilities shared across Courier crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: side-effect-free utilities (environment header loading)
//! - `runtime`: async infrastructure (token cache, backoff, cancellable
//!   delays) with tracing
//! - `test-utils`: mock token sources for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod utils;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod auth;
#[cfg(feature = "runtime")]
pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", all(test, feature = "runtime")))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use auth::{AccessToken, TokenCache, TokenError, TokenSource};
#[cfg(feature = "runtime")]
pub use resilience::{sleep_or_cancel, Cancelled, ExponentialBackoff};
#[cfg(feature = "foundation")]
pub use utils::env::{load_headers, load_headers_from_env};
