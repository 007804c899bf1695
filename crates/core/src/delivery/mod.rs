//! Record delivery
//!
//! - [`ports`]: the single-attempt sender the engine drives
//! - [`retry`]: classification and exponential-backoff retry loop
//! - [`payload`] and [`correlation`]: what to send and how to tag it
//! - [`service`]: the per-record pipeline tying them together

pub mod correlation;
pub mod payload;
pub mod ports;
pub mod retry;
pub mod service;

pub use correlation::correlation_id;
pub use payload::request_body;
pub use ports::RequestSender;
pub use retry::{classify, RetryEngine, RetryPolicy, Verdict};
pub use service::DeliveryService;
