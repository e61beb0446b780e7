//! [`Backend`] implementation for [`MongoHandler`].

use async_trait::async_trait;

use rest_layer_resource::{Backend, BackendCapability, BackendError, BackendKind};

use crate::error::BACKEND_NAME;
use crate::handler::MongoHandler;

#[async_trait]
impl Backend for MongoHandler {
    fn kind(&self) -> BackendKind {
        BackendKind::MongoDB
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn supports(&self, capability: BackendCapability) -> bool {
        matches!(
            capability,
            BackendCapability::Crud
                | BackendCapability::OptimisticLocking
                | BackendCapability::Sorting
                | BackendCapability::OffsetPagination
                | BackendCapability::Aggregation
                | BackendCapability::WindowedClear
                | BackendCapability::RegexMatch
        )
    }

    fn capabilities(&self) -> Vec<BackendCapability> {
        vec![
            BackendCapability::Crud,
            BackendCapability::OptimisticLocking,
            BackendCapability::Sorting,
            BackendCapability::OffsetPagination,
            BackendCapability::Aggregation,
            BackendCapability::WindowedClear,
            BackendCapability::RegexMatch,
        ]
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let unavailable = |message: String| BackendError::Unavailable {
            backend_name: BACKEND_NAME.to_string(),
            message,
        };
        self.deadline(self.collection().estimated_document_count())
            .await
            .map_err(|_| unavailable("Health check timed out".to_string()))?
            .map_err(|e| unavailable(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}
