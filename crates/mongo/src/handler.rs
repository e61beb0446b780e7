//! MongoDB storage handler.

use std::fmt::Debug;
use std::future::IntoFuture;
use std::time::Duration;

use mongodb::bson::Document;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};

use rest_layer_resource::StorageResult;

use crate::config::MongoConfig;
use crate::error::{connection_failed, internal_error, timeout_error};

/// Storage handler backed by one MongoDB collection.
///
/// The handler is a thin wrapper around a driver [`Collection`]: it holds no
/// cross-call state, so clones share the underlying connection pool and may
/// be used concurrently.
///
/// # Example
///
/// ```ignore
/// use rest_layer_mongo::{MongoConfig, MongoHandler};
///
/// let handler = MongoHandler::connect(MongoConfig::new("app", "users")).await?;
/// handler.insert(&[item]).await?;
/// ```
#[derive(Clone)]
pub struct MongoHandler {
    /// The collection holding the items.
    collection: Collection<Document>,
    /// Deadline applied to every store round trip.
    request_timeout: Option<Duration>,
}

impl Debug for MongoHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoHandler")
            .field("namespace", &self.collection.namespace().to_string())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl MongoHandler {
    /// Creates a handler on an already opened collection.
    pub fn new(collection: Collection<Document>) -> Self {
        Self {
            collection,
            request_timeout: None,
        }
    }

    /// Connects to the server described by `config` and opens its collection.
    ///
    /// The driver connects lazily: this only validates the connection string
    /// and builds the client.
    ///
    /// # Errors
    ///
    /// * `StorageError::Backend(ConnectionFailed)` - If the options cannot be
    ///   parsed or the client cannot be built
    pub async fn connect(config: MongoConfig) -> StorageResult<Self> {
        let mut options = ClientOptions::parse(config.uri.as_str())
            .await
            .map_err(|e| connection_failed(format!("Invalid connection string: {}", e)))?;
        options.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
        options.server_selection_timeout =
            Some(Duration::from_millis(config.server_selection_timeout_ms));
        if let Some(app_name) = &config.app_name {
            options.app_name = Some(app_name.clone());
        }

        let client = Client::with_options(options)
            .map_err(|e| connection_failed(format!("Failed to build client: {}", e)))?;

        tracing::info!(
            "MongoDB handler configured for {}.{}",
            config.database,
            config.collection
        );

        let handler = Self::new(
            client
                .database(&config.database)
                .collection::<Document>(&config.collection),
        );
        Ok(match config.request_timeout() {
            Some(timeout) => handler.with_request_timeout(timeout),
            None => handler,
        })
    }

    /// Bounds every store round trip by `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Returns the underlying collection.
    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }

    /// Returns the configured round trip deadline.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Awaits one store round trip, enforcing the request deadline.
    ///
    /// The driver result is returned untouched so callers can inspect
    /// specific server errors.
    pub(crate) async fn deadline<F>(&self, op: F) -> StorageResult<F::Output>
    where
        F: IntoFuture,
    {
        let Some(limit) = self.request_timeout else {
            return Ok(op.await);
        };
        tokio::time::timeout(limit, op).await.map_err(|_| {
            let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(
                "MongoDB request on {} timed out after {}ms",
                self.collection.name(),
                timeout_ms
            );
            timeout_error(timeout_ms)
        })
    }

    /// Awaits one store round trip and maps driver errors.
    pub(crate) async fn run<F, T>(&self, op: F) -> StorageResult<T>
    where
        F: IntoFuture<Output = mongodb::error::Result<T>>,
    {
        self.deadline(op).await?.map_err(internal_error)
    }
}
