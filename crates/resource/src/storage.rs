//! Storage handler traits.
//!
//! This module defines the [`Storer`] trait every storage handler implements,
//! plus the optional [`Counter`] and [`Aggregator`] extensions.
//!
//! # Concurrency
//!
//! Handlers hold no cross-call state. Optimistic concurrency is expressed
//! through ETags: `update` and `delete` only apply when the stored item still
//! carries the ETag of the `original` item the caller read.
//!
//! # Cancellation
//!
//! All methods return futures; dropping a future aborts the in-flight backend
//! round trip. A handler never applies a write partially.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::item::{Item, ItemList};
use crate::query::{GroupCount, Query};

/// Core storage trait for resource items.
///
/// # Example
///
/// ```ignore
/// use rest_layer_resource::{Item, Storer};
///
/// async fn rename<S: Storer>(storage: &S, original: &Item) -> StorageResult<()> {
///     let mut updated = original.clone();
///     updated.etag = "etag2".to_string();
///     updated.payload.insert("name".into(), "renamed".into());
///     storage.update(&updated, original).await
/// }
/// ```
#[async_trait]
pub trait Storer: Send + Sync {
    /// Stores new items.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(AlreadyExists)` - If an item with the same ID is stored
    async fn insert(&self, items: &[Item]) -> StorageResult<()>;

    /// Replaces `original` with `item` if the stored ETag still matches
    /// `original.etag`.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If no item has `original.id`
    /// * `StorageError::Concurrency(EtagMismatch)` - If the stored ETag differs
    async fn update(&self, item: &Item, original: &Item) -> StorageResult<()>;

    /// Removes `item` if the stored ETag still matches `item.etag`.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If no item has `item.id`
    /// * `StorageError::Concurrency(EtagMismatch)` - If the stored ETag differs
    async fn delete(&self, item: &Item) -> StorageResult<()>;

    /// Removes every item matching the query's predicate, restricted by its
    /// sort and window. Returns the number of removed items.
    ///
    /// # Errors
    ///
    /// * `StorageError::Query` - If the predicate cannot be expressed
    async fn clear(&self, query: &Query) -> StorageResult<u64>;

    /// Returns the page of items selected by the query.
    ///
    /// # Errors
    ///
    /// * `StorageError::Query` - If the predicate cannot be expressed
    async fn find(&self, query: &Query) -> StorageResult<ItemList>;
}

/// Extension trait for handlers that can count matching items directly.
#[async_trait]
pub trait Counter: Storer {
    /// Returns the number of items matching the query's predicate.
    async fn count(&self, query: &Query) -> StorageResult<u64>;
}

/// Extension trait for handlers that can evaluate [`Query::aggregate`].
#[async_trait]
pub trait Aggregator: Storer {
    /// Groups matching items and returns the per-group totals.
    ///
    /// # Errors
    ///
    /// * `StorageError::Query` - If the query has no aggregate or an
    ///   unsupported one
    async fn aggregate(&self, query: &Query) -> StorageResult<Vec<GroupCount>>;
}
