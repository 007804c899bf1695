//! Testing utilities and helpers
//!
//! - **[`mocks`]**: mock token sources with call counting, delays and
//!   scripted failures
//!
//! Mocks for the delivery ports (sinks, publishers) live next to those ports
//! in `courier-core`.

pub mod mocks;

pub use mocks::CountingTokenSource;
