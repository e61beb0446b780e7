//! ETag codec.
//!
//! Maps an item's version token and update time onto the reserved `_etag` and
//! `_updated` fields of a stored document, and back.
//!
//! # Legacy records
//!
//! Documents written by other systems may lack `_etag`, or hold one that is
//! not a string. They are read with a synthesized ETag `"p-" + id`, and a guarded write using that synthesized
//! value matches them exactly once: the write stores a real `_etag`, after
//! which the synthesized value no longer matches.

use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::{self, Bson, Document, doc};

use crate::document::ID_KEY;

/// Reserved field holding the item ETag.
pub const ETAG_FIELD: &str = "_etag";

/// Reserved field holding the item update time (millisecond precision).
pub const UPDATED_FIELD: &str = "_updated";

const LEGACY_ETAG_PREFIX: &str = "p-";

/// Returns the ETag assigned to a stored document lacking `_etag`.
pub fn synthesize(id: &str) -> String {
    format!("{LEGACY_ETAG_PREFIX}{id}")
}

/// Returns true if `etag` is the synthesized ETag of item `id`.
pub fn is_synthesized(id: &str, etag: &str) -> bool {
    etag.strip_prefix(LEGACY_ETAG_PREFIX) == Some(id)
}

/// Builds the reserved metadata fields to merge into a write document.
///
/// An empty ETag is not stored, so the item reads back as a legacy record.
pub fn encode(etag: &str, updated: DateTime<Utc>) -> Document {
    let mut fields = Document::new();
    if !etag.is_empty() {
        fields.insert(ETAG_FIELD, etag);
    }
    fields.insert(
        UPDATED_FIELD,
        bson::DateTime::from_millis(updated.timestamp_millis()),
    );
    fields
}

/// Extracts the ETag of a stored document, synthesizing one for legacy records.
pub fn decode(document: &Document, id: &str) -> String {
    match document.get(ETAG_FIELD) {
        Some(Bson::String(etag)) => etag.clone(),
        _ => synthesize(id),
    }
}

/// Extracts the update time of a stored document.
///
/// Documents without a valid `_updated` field yield the Unix epoch.
pub fn decode_updated(document: &Document) -> DateTime<Utc> {
    document
        .get_datetime(UPDATED_FIELD)
        .ok()
        .and_then(|dt| Utc.timestamp_millis_opt(dt.timestamp_millis()).single())
        .unwrap_or_default()
}

/// Decides whether `expected` matches the stored document.
///
/// A stored string `_etag` must be equal to `expected`; a legacy document
/// only matches its synthesized ETag. Always agrees with [`decode`].
pub fn matches(expected: &str, document: &Document, id: &str) -> bool {
    decode(document, id) == expected
}

/// Builds the filter guarding a conditional write on item `id`.
///
/// The identifier and ETag conditions live in the same filter so that the
/// store evaluates them atomically with the write. A synthesized ETag also
/// matches a document whose `_etag` is missing or not a string.
pub fn guard_filter(id: &str, expected: &str) -> Document {
    if is_synthesized(id, expected) {
        doc! {
            ID_KEY: id,
            "$or": [
                { ETAG_FIELD: expected },
                { ETAG_FIELD: { "$not": { "$type": "string" } } }
            ],
        }
    } else {
        doc! {
            ID_KEY: id,
            ETAG_FIELD: expected,
        }
    }
}
