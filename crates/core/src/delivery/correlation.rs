//! Correlation IDs linking records to their response records

use courier_domain::constants::CORRELATION_ID_METADATA_KEY;
use courier_domain::InputRecord;
use uuid::Uuid;

/// Derive the correlation ID for `record`.
///
/// Precedence: the `correlation_id` metadata entry, then the position, then
/// the key, each only when non-empty. Records with none of them get a fresh
/// random UUID on every call.
pub fn correlation_id(record: &InputRecord) -> String {
    if let Some(id) = record.metadata.get(CORRELATION_ID_METADATA_KEY).filter(|id| !id.is_empty())
    {
        return id.clone();
    }

    [&record.position, &record.key]
        .into_iter()
        .flatten()
        .find(|bytes| !bytes.is_empty())
        .map_or_else(
            || Uuid::new_v4().to_string(),
            |bytes| String::from_utf8_lossy(bytes).into_owned(),
        )
}
