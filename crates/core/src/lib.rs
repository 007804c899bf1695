//! # Courier Core
//!
//! Delivery logic with no I/O of its own.
//!
//! This crate contains:
//! - Port interfaces (request sender, response sinks, broker publisher,
//!   connector lifecycle)
//! - The retry engine and its classification policy
//! - Response routing and the per-record delivery service
//!
//! ## Architecture Principles
//! - Depends only on `courier-common` and `courier-domain`
//! - No HTTP, file or broker code
//! - All external effects go through traits

pub mod delivery;
pub mod routing;

// Infrastructure ports
pub mod connector_ports;
pub mod sink_ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use connector_ports::{Connector, ConnectorSpec};
pub use delivery::{DeliveryService, RequestSender, RetryEngine, RetryPolicy};
pub use routing::{ResponseRouter, Route};
pub use sink_ports::{BrokerMessage, MessagePublisher, ResponseSink, SinkError};
