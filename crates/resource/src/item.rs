//! Stored item types.
//!
//! This module defines the [`Item`] type, which wraps a resource payload with
//! the metadata every storage handler must persist: identifier, ETag and the
//! last update timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A resource payload with persistence metadata.
///
/// # Examples
///
/// ```
/// use rest_layer_resource::Item;
/// use serde_json::json;
///
/// let item = Item::new("1234", "etag1", chrono::Utc::now())
///     .with_field("foo", json!("bar"));
///
/// assert_eq!(item.id, "1234");
/// assert_eq!(item.payload["foo"], "bar");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// The item's identifier, unique within a collection.
    pub id: String,

    /// Opaque version token, changed on every successful write.
    pub etag: String,

    /// Time of the last write.
    pub updated: DateTime<Utc>,

    /// The resource fields. May carry a duplicate `id` entry.
    pub payload: Map<String, Value>,
}

impl Item {
    /// Creates an item with an empty payload.
    pub fn new(id: impl Into<String>, etag: impl Into<String>, updated: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            etag: etag.into(),
            updated,
            payload: Map::new(),
        }
    }

    /// Sets a payload field.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.payload.insert(name.into(), value);
        self
    }
}

/// A page of items returned by a find operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemList {
    /// Total number of items matching the query, or `None` when the handler
    /// did not compute it (the host renders this as `-1`).
    pub total: Option<u64>,

    /// The returned page.
    pub items: Vec<Item>,
}

impl ItemList {
    /// Total as the host's signed sentinel form (`-1` = unknown).
    pub fn total_or_unknown(&self) -> i64 {
        self.total
            .and_then(|t| i64::try_from(t).ok())
            .unwrap_or(-1)
    }
}
