//! Backend abstraction for storage handlers.
//!
//! This module defines the [`Backend`] trait, which lets the resource layer
//! discover what a handler's store can do and whether it is reachable,
//! independently of the [`Storer`](crate::Storer) operations themselves.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BackendError;

/// Identifies the type of store behind a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// MongoDB (document store).
    MongoDB,
    /// Custom or unknown backend.
    Custom(&'static str),
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::MongoDB => write!(f, "mongodb"),
            BackendKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Capabilities that a handler may support.
///
/// Used by the resource layer to decide which requests it can route to a
/// handler without first trying them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCapability {
    /// Insert, update, delete and find.
    Crud,
    /// ETag guarded update and delete.
    OptimisticLocking,
    /// Sorting results.
    Sorting,
    /// Offset/limit windows.
    OffsetPagination,
    /// Group-by aggregates.
    Aggregation,
    /// Clear restricted by sort and window.
    WindowedClear,
    /// Regular expression predicates.
    RegexMatch,
}

impl std::fmt::Display for BackendCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendCapability::Crud => "crud",
            BackendCapability::OptimisticLocking => "optimistic-locking",
            BackendCapability::Sorting => "sorting",
            BackendCapability::OffsetPagination => "offset-pagination",
            BackendCapability::Aggregation => "aggregation",
            BackendCapability::WindowedClear => "windowed-clear",
            BackendCapability::RegexMatch => "regex-match",
        };
        write!(f, "{}", name)
    }
}

/// A store that a storage handler talks to.
///
/// # Example
///
/// ```ignore
/// use rest_layer_resource::backend::{Backend, BackendCapability};
///
/// if !handler.supports(BackendCapability::Aggregation) {
///     return Err(not_implemented());
/// }
/// handler.health_check().await?;
/// ```
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Returns the kind of backend.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable name for this backend.
    fn name(&self) -> &'static str;

    /// Checks if this backend supports the given capability.
    fn supports(&self, capability: BackendCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Returns all capabilities supported by this backend.
    fn capabilities(&self) -> Vec<BackendCapability>;

    /// Checks if the backend is reachable and answering requests.
    async fn health_check(&self) -> Result<(), BackendError>;
}
