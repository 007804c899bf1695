//! Response routing
//!
//! Turns each delivery outcome into a [`ResponseRecord`](courier_domain::ResponseRecord)
//! and publishes it to the success or the error sink.

pub mod router;

pub use router::{ResponseRouter, Route};
