//! Configuration loading
//!
//! Reads a [`courier_domain::DestinationConfig`] from a JSON or TOML file.

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_file, parse_config, probe_config_paths, CONFIG_PATH_ENV};
