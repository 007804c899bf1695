//! Common utility functions
//!
//! - **[`env`]**: request headers derived from environment variables

pub mod env;

pub use self::env::{load_headers, load_headers_from_env};
