//! Token acquisition and caching
//!
//! - [`TokenSource`]: port for anything that can mint an access token
//! - [`TokenCache`]: expiry-aware cache with single-flight renewal
//! - [`AccessToken`]: token secret plus optional deadline

pub mod token;
pub mod token_cache;
pub mod traits;

pub use token::AccessToken;
pub use token_cache::TokenCache;
pub use traits::{TokenError, TokenSource};
