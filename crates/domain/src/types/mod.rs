//! Records flowing through the delivery engine

pub mod outcome;
pub mod record;
pub mod response;

pub use outcome::DeliveryOutcome;
pub use record::{InputRecord, Operation};
pub use response::{canonical_header_name, DeliveryResponse, HeaderValue, ResponseRecord};
