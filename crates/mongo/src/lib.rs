//! MongoDB storage handler for rest-layer resources.
//!
//! This crate implements the [`Storer`](rest_layer_resource::Storer),
//! [`Counter`](rest_layer_resource::Counter) and
//! [`Aggregator`](rest_layer_resource::Aggregator) traits on top of a single
//! MongoDB collection.
//!
//! # Architecture
//!
//! - [`query`] - Translation of predicates, sorts and aggregates to MongoDB
//!   documents
//! - [`etag`] - ETag and update time encoding, including legacy records
//! - [`document`] - Item ⇄ BSON document mapping
//! - [`total`] - Decides when a find result needs a separate count
//! - [`MongoHandler`] - The CRUD engine
//!
//! # Storage layout
//!
//! Each item is one document:
//!
//! ```text
//! { "_id": <item id>, "_etag": <etag>, "_updated": <date>, <payload fields>... }
//! ```
//!
//! Update and delete are single conditional writes filtered on `_id` and
//! `_etag`, so competing writers are arbitrated by the server.
//!
//! # Quick Start
//!
//! ```no_run
//! use rest_layer_mongo::{MongoConfig, MongoHandler};
//! use rest_layer_resource::query::{Expression, Query, Window};
//! use rest_layer_resource::{Item, Storer};
//! use serde_json::json;
//!
//! # async fn example() -> rest_layer_resource::StorageResult<()> {
//! let handler = MongoHandler::connect(MongoConfig::new("app", "users")).await?;
//!
//! let item = Item::new("1", "etag1", chrono::Utc::now()).with_field("name", json!("a"));
//! handler.insert(&[item]).await?;
//!
//! let page = handler
//!     .find(
//!         &Query::new()
//!             .with_predicate(Expression::eq("name", "a"))
//!             .with_window(Window::page(1, 20, 0)),
//!     )
//!     .await?;
//! assert_eq!(page.items.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod backend;
pub mod config;
pub mod document;
mod error;
pub mod etag;
mod handler;
pub mod query;
mod storage;
pub mod total;

pub use config::MongoConfig;
pub use handler::MongoHandler;
