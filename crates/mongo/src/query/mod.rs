//! Query translation.
//!
//! Converts the resource layer's [`Query`](rest_layer_resource::Query) model
//! into MongoDB filter, sort and `$group` documents. Translation is pure: it
//! never touches the store, and the same input always yields the same output.

mod aggregate;
mod predicate;
mod sort;

pub use aggregate::{aggregate_pipeline, translate_aggregate};
pub use predicate::{translate_expression, translate_predicate};
pub use sort::{sort_document, sort_fields};

use rest_layer_resource::ID_FIELD;

use crate::document::ID_KEY;

/// Maps a resource field name to its stored name.
pub fn native_field(field: &str) -> &str {
    if field == ID_FIELD { ID_KEY } else { field }
}
