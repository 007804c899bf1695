//! # Courier Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Authentication strategies and the OAuth2 client-credentials source
//! - The pooled HTTP delivery client
//! - File and broker response sinks
//! - The `Destination` connector that wires them together
//! - Configuration loading and logging setup
//!
//! ## Architecture
//! - Implements traits defined in `courier-core`
//! - Depends on `courier-common`, `courier-domain` and `courier-core`
//! - Contains all "impure" code (network, files, environment)

pub mod auth;
pub mod config;
pub mod destination;
pub mod errors;
pub mod http;
pub mod observability;
pub mod sinks;

// Re-export commonly used items
pub use auth::{AuthStrategy, ClientCredentialsSource};
pub use destination::Destination;
pub use errors::InfraError;
pub use http::{DeliveryClient, DeliveryClientBuilder};
pub use observability::{init_logging, LogFormat};
pub use sinks::{BrokerSink, FileSink};
