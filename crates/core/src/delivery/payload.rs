//! Request body selection

use courier_domain::{CourierError, InputRecord, Result};

/// Pick the request body for `record`.
///
/// The after-payload wins when `use_payload_after` is set and it is present;
/// otherwise the before-payload is used.
///
/// # Errors
///
/// Returns [`CourierError::NoPayload`] when neither applicable payload is
/// present.
pub fn request_body(record: &InputRecord, use_payload_after: bool) -> Result<&[u8]> {
    if use_payload_after {
        if let Some(after) = &record.payload_after {
            return Ok(after);
        }
    }
    record.payload_before.as_deref().ok_or(CourierError::NoPayload)
}
