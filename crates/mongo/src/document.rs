//! Item ⇄ BSON document mapping.
//!
//! An item is stored as a single document: the identifier under `_id`, the
//! ETag and update time under the reserved fields of [`crate::etag`], and the
//! payload entries as top-level siblings. The payload's duplicate `id` entry
//! is not stored; it is restored from `_id` on read.

use mongodb::bson::{Bson, Document};
use rest_layer_resource::{BackendError, ID_FIELD, Item, StorageError, StorageResult};
use serde_json::{Map, Number, Value};

use crate::etag::{self, ETAG_FIELD, UPDATED_FIELD};

/// Primary key field of stored documents.
pub const ID_KEY: &str = "_id";

/// Builds the document stored for `item`.
pub fn to_document(item: &Item) -> Document {
    let mut document = Document::new();
    document.insert(ID_KEY, item.id.as_str());
    for (name, value) in &item.payload {
        if name == ID_FIELD {
            continue;
        }
        document.insert(name.as_str(), to_bson(value));
    }
    for (name, value) in etag::encode(&item.etag, item.updated) {
        document.insert(name, value);
    }
    document
}

/// Rebuilds an item from a stored document.
///
/// # Errors
///
/// * `StorageError::Backend(SerializationError)` - If the document has no `_id`
pub fn from_document(mut document: Document) -> StorageResult<Item> {
    let id = match document.remove(ID_KEY) {
        Some(raw) => id_string(&raw),
        None => {
            return Err(StorageError::Backend(BackendError::SerializationError {
                message: "stored document has no _id".to_string(),
            }));
        }
    };
    let etag = etag::decode(&document, &id);
    let updated = etag::decode_updated(&document);
    document.remove(ETAG_FIELD);
    document.remove(UPDATED_FIELD);

    let mut payload = Map::with_capacity(document.len() + 1);
    payload.insert(ID_FIELD.to_string(), Value::String(id.clone()));
    for (name, value) in document {
        payload.insert(name, to_json(value));
    }

    Ok(Item {
        id,
        etag,
        updated,
        payload,
    })
}

/// Renders a stored `_id` as an item identifier.
pub fn id_string(raw: &Bson) -> String {
    match raw {
        Bson::String(s) => s.clone(),
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

/// Converts a payload value to BSON, keeping integers integral.
pub fn to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => number_to_bson(n),
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(values) => Bson::Array(values.iter().map(to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.iter()
                .map(|(k, v)| (k.clone(), to_bson(v)))
                .collect(),
        ),
    }
}

fn number_to_bson(n: &Number) -> Bson {
    match n.as_i64() {
        Some(i) => Bson::Int64(i),
        None => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
    }
}

/// Converts a stored BSON value back to JSON.
///
/// Types without a JSON counterpart (dates, object ids, binaries) use their
/// relaxed extended JSON form.
pub fn to_json(value: Bson) -> Value {
    match value {
        Bson::Int32(i) => Value::from(i),
        Bson::Int64(i) => Value::from(i),
        Bson::Array(values) => Value::Array(values.into_iter().map(to_json).collect()),
        Bson::Document(document) => Value::Object(
            document
                .into_iter()
                .map(|(k, v)| (k, to_json(v)))
                .collect(),
        ),
        other => other.into_relaxed_extjson(),
    }
}
