//! # Courier Domain
//!
//! Business types for the HTTP delivery engine.
//!
//! This crate contains:
//! - Input records, buffered HTTP responses and persisted response records
//! - Delivery outcomes
//! - Destination configuration and its validation
//! - Domain error types and Result definitions
//! - Connector and default constants
//!
//! ## Architecture
//! - No dependencies on other Courier crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
