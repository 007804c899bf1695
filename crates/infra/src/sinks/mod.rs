//! Response sink implementations
//!
//! - [`FileSink`]: NDJSON lines appended to a local file
//! - [`BrokerSink`]: messages handed to a host-supplied broker producer

pub mod broker;
pub mod file;

pub use broker::BrokerSink;
pub use file::FileSink;
