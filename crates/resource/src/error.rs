//! Error types for storage handlers.
//!
//! Errors are grouped the same way for every handler: resource state,
//! concurrency, query shape and backend failures. The host only needs the
//! classifiers ([`StorageError::is_conflict`], [`StorageError::is_not_found`],
//! [`StorageError::is_not_implemented`]) to map them onto its responses.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Concurrency and versioning errors
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// Query shape errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to resource state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// No stored item carries the given identifier.
    #[error("item not found: {id}")]
    NotFound { id: String },

    /// An item with the given identifier is already stored.
    #[error("item already exists: {id}")]
    AlreadyExists { id: String },
}

/// Errors related to optimistic concurrency control.
#[derive(Error, Debug)]
pub enum ConcurrencyError {
    /// The stored item exists but its ETag differs from the expected one.
    #[error("etag mismatch: item {id} was modified (expected etag {expected})")]
    EtagMismatch { id: String, expected: String },
}

/// Errors raised when a query falls outside a handler's vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The predicate contains an expression kind the handler cannot express.
    #[error("not implemented: unsupported expression {kind}")]
    UnsupportedExpression { kind: String },

    /// The aggregate specification has an unsupported shape.
    #[error("not implemented: unsupported aggregate ({message})")]
    UnsupportedAggregate { message: String },
}

/// Errors originating from the storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// The backend is reachable but not serving requests.
    #[error("{backend_name} unavailable: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// The backend did not answer within the request deadline.
    #[error("{backend_name} request timed out after {timeout_ms}ms")]
    Timeout {
        backend_name: String,
        timeout_ms: u64,
    },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

impl StorageError {
    /// Returns true when the operation lost an optimistic concurrency race:
    /// either the identifier is already taken or the ETag did not match.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::Resource(ResourceError::AlreadyExists { .. })
                | StorageError::Concurrency(ConcurrencyError::EtagMismatch { .. })
        )
    }

    /// Returns true when no item with the requested identifier exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }

    /// Returns true when the query uses a feature the handler does not implement.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, StorageError::Query(_))
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for query translation.
pub type QueryResult<T> = Result<T, QueryError>;
