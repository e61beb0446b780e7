//! Handler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for [`MongoHandler::connect`](crate::MongoHandler::connect).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoConfig {
    /// Connection string (default: `"mongodb://localhost:27017"`).
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Database name (default: `"rest_layer"`).
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection holding the resource's items.
    pub collection: String,

    /// Application name reported to the server.
    #[serde(default)]
    pub app_name: Option<String>,

    /// Connection establishment timeout in milliseconds (default: 10000).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Server selection timeout in milliseconds (default: 30000).
    #[serde(default = "default_server_selection_timeout_ms")]
    pub server_selection_timeout_ms: u64,

    /// Deadline for every store round trip; unbounded when absent.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "rest_layer".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_server_selection_timeout_ms() -> u64 {
    30_000
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            database: default_database(),
            collection: "items".to_string(),
            app_name: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            server_selection_timeout_ms: default_server_selection_timeout_ms(),
            request_timeout_ms: None,
        }
    }
}

impl MongoConfig {
    /// Creates a configuration for `collection` in `database` with default
    /// connection settings.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// Sets the connection string.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Sets the per round trip deadline.
    pub fn with_request_timeout_ms(mut self, timeout: u64) -> Self {
        self.request_timeout_ms = Some(timeout);
        self
    }

    pub(crate) fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
