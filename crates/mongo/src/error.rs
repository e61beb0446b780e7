//! Driver error mapping.

use mongodb::error::{Error as DriverError, ErrorKind, WriteFailure};
use rest_layer_resource::{BackendError, StorageError};

/// Backend name used in error and log messages.
pub(crate) const BACKEND_NAME: &str = "mongodb";

/// Server error code reported for unique index violations.
const DUPLICATE_KEY: i32 = 11000;

/// Wraps a driver error as an internal backend error.
pub(crate) fn internal_error(err: DriverError) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: BACKEND_NAME.to_string(),
        message: err.to_string(),
        source: Some(Box::new(err)),
    })
}

/// Wraps a client setup failure.
pub(crate) fn connection_failed(message: impl Into<String>) -> StorageError {
    StorageError::Backend(BackendError::ConnectionFailed {
        backend_name: BACKEND_NAME.to_string(),
        message: message.into(),
    })
}

/// Builds the error returned when a round trip exceeds its deadline.
pub(crate) fn timeout_error(timeout_ms: u64) -> StorageError {
    StorageError::Backend(BackendError::Timeout {
        backend_name: BACKEND_NAME.to_string(),
        timeout_ms,
    })
}

/// Returns true if the driver error is a unique `_id` violation.
pub(crate) fn is_duplicate_key(err: &DriverError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}
