//! Rest Layer resource abstractions
//!
//! This crate holds the types shared between the resource layer and its
//! storage handlers: the stored [`Item`], the [`Query`] model, the error
//! taxonomy and the [`Storer`] trait.
//!
//! # Architecture
//!
//! - [`item`] - Stored items and result pages
//! - [`query`] - Predicates, sorts, windows and aggregates
//! - [`error`] - Error types for all operations
//! - [`storage`] - Storage handler traits
//! - [`backend`] - Capability discovery and health checks
//!
//! # Quick Start
//!
//! ```
//! use rest_layer_resource::query::{Expression, Query, Window};
//! use rest_layer_resource::Item;
//! use serde_json::json;
//!
//! let item = Item::new("1", "etag1", chrono::Utc::now())
//!     .with_field("id", json!("1"))
//!     .with_field("name", json!("a"));
//!
//! let query = Query::new()
//!     .with_predicate(Expression::eq("name", "a"))
//!     .with_window(Window::page(1, 20, 0));
//!
//! assert_eq!(item.payload["name"], "a");
//! assert!(query.aggregate.is_none());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backend;
pub mod error;
pub mod item;
pub mod query;
pub mod storage;

pub use backend::{Backend, BackendCapability, BackendKind};
pub use error::{
    BackendError, ConcurrencyError, QueryError, QueryResult, ResourceError, StorageError,
    StorageResult,
};
pub use item::{Item, ItemList};
pub use query::Query;
pub use storage::{Aggregator, Counter, Storer};

/// Name of the identifier field in item payloads and queries.
pub const ID_FIELD: &str = "id";
