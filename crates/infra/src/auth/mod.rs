//! Request authentication
//!
//! - [`AuthStrategy`]: closed set of schemes chosen once at open time
//! - [`ClientCredentialsSource`]: OAuth2 client-credentials grant behind the
//!   shared token cache

pub mod client_credentials;
pub mod strategy;

pub use client_credentials::ClientCredentialsSource;
pub use strategy::AuthStrategy;
