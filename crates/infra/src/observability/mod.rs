//! Observability infrastructure
//!
//! Structured logging through `tracing`. Every component logs with fields
//! (`correlation_id`, `attempt`, `status`, ...) rather than formatted text;
//! this module only installs the subscriber that renders them.

pub mod logging;

pub use logging::{init_logging, LogFormat, DEFAULT_FILTER};
