//! [`Storer`] implementation for [`MongoHandler`].

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use serde_json::Value;

use rest_layer_resource::query::{GroupCount, Window};
use rest_layer_resource::{
    Aggregator, ConcurrencyError, Counter, Item, ItemList, Query, ResourceError, StorageError,
    StorageResult, Storer,
};

use crate::document::{self, ID_KEY};
use crate::error::{internal_error, is_duplicate_key};
use crate::etag::{self, ETAG_FIELD};
use crate::handler::MongoHandler;
use crate::query::{aggregate_pipeline, sort_document, sort_fields, translate_predicate};
use crate::total::{TotalEstimate, estimate_total};

impl MongoHandler {
    /// Classifies a guarded write that matched nothing.
    ///
    /// The write itself is atomic; this follow-up read only picks the error.
    async fn guard_failure(&self, id: &str, expected: &str) -> StorageError {
        let probe = self
            .collection()
            .find_one(doc! { ID_KEY: id })
            .projection(doc! { ETAG_FIELD: 1 });
        match self.run(probe).await {
            Ok(None) => ResourceError::NotFound { id: id.to_string() }.into(),
            Ok(Some(stored)) => {
                if etag::matches(expected, &stored, id) {
                    // Changed and changed back between the write and this read
                    tracing::warn!(
                        "Concurrent write on {}/{} (expected {})",
                        self.collection().name(),
                        id,
                        expected
                    );
                } else {
                    tracing::warn!(
                        "ETag mismatch on {}/{} (expected {}, stored {})",
                        self.collection().name(),
                        id,
                        expected,
                        etag::decode(&stored, id)
                    );
                }
                ConcurrencyError::EtagMismatch {
                    id: id.to_string(),
                    expected: expected.to_string(),
                }
                .into()
            }
            Err(e) => e,
        }
    }

    /// Reads the documents matching `filter` in query order within `window`.
    async fn fetch(
        &self,
        filter: Document,
        query: &Query,
        window: Option<&Window>,
        projection: Option<Document>,
    ) -> StorageResult<Vec<Document>> {
        let mut find = self
            .collection()
            .find(filter)
            .sort(sort_document(&sort_fields(query)));
        if let Some(window) = window {
            if window.offset > 0 {
                find = find.skip(window.offset);
            }
            if window.limit > 0 {
                find = find.limit(window.limit);
            }
        }
        if let Some(projection) = projection {
            find = find.projection(projection);
        }
        self.run(async move { find.await?.try_collect::<Vec<Document>>().await })
            .await
    }
}

#[async_trait]
impl Storer for MongoHandler {
    async fn insert(&self, items: &[Item]) -> StorageResult<()> {
        for item in items {
            let op = self.collection().insert_one(document::to_document(item));
            match self.deadline(op).await? {
                Ok(_) => {}
                Err(e) if is_duplicate_key(&e) => {
                    tracing::warn!(
                        "Insert conflict on {}/{}: id already stored",
                        self.collection().name(),
                        item.id
                    );
                    return Err(ResourceError::AlreadyExists {
                        id: item.id.clone(),
                    }
                    .into());
                }
                Err(e) => return Err(internal_error(e)),
            }
        }
        tracing::debug!(
            "Inserted {} items into {}",
            items.len(),
            self.collection().name()
        );
        Ok(())
    }

    async fn update(&self, item: &Item, original: &Item) -> StorageResult<()> {
        let filter = etag::guard_filter(&original.id, &original.etag);
        let op = self
            .collection()
            .replace_one(filter, document::to_document(item));
        let result = self.run(op).await?;
        if result.matched_count == 0 {
            return Err(self.guard_failure(&original.id, &original.etag).await);
        }
        tracing::debug!(
            "Updated {}/{} (etag {} -> {})",
            self.collection().name(),
            original.id,
            original.etag,
            item.etag
        );
        Ok(())
    }

    async fn delete(&self, item: &Item) -> StorageResult<()> {
        let filter = etag::guard_filter(&item.id, &item.etag);
        let result = self.run(self.collection().delete_one(filter)).await?;
        if result.deleted_count == 0 {
            return Err(self.guard_failure(&item.id, &item.etag).await);
        }
        tracing::debug!("Deleted {}/{}", self.collection().name(), item.id);
        Ok(())
    }

    async fn clear(&self, query: &Query) -> StorageResult<u64> {
        let filter = translate_predicate(&query.predicate)?;

        let Some(window) = query.window.as_ref() else {
            let result = self.run(self.collection().delete_many(filter)).await?;
            tracing::debug!(
                "Cleared {} items from {}",
                result.deleted_count,
                self.collection().name()
            );
            return Ok(result.deleted_count);
        };

        // The bulk delete has no sort/skip/limit, so resolve the window's ids first.
        let ids: Vec<Bson> = self
            .fetch(filter, query, Some(window), Some(doc! { ID_KEY: 1 }))
            .await?
            .into_iter()
            .filter_map(|mut d| d.remove(ID_KEY))
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let cleared = ids.len() as u64;
        self.run(
            self.collection()
                .delete_many(doc! { ID_KEY: { "$in": ids } }),
        )
        .await?;
        tracing::debug!(
            "Cleared {} items from {} (offset {}, limit {})",
            cleared,
            self.collection().name(),
            window.offset,
            window.limit
        );
        Ok(cleared)
    }

    async fn find(&self, query: &Query) -> StorageResult<ItemList> {
        let filter = translate_predicate(&query.predicate)?;
        let window = query.window.as_ref();

        let items = if window.is_some_and(Window::is_count_probe) {
            Vec::new()
        } else {
            self.fetch(filter.clone(), query, window, None)
                .await?
                .into_iter()
                .map(document::from_document)
                .collect::<StorageResult<Vec<_>>>()?
        };

        let total = match estimate_total(window, items.len()) {
            TotalEstimate::Count => {
                Some(self.run(self.collection().count_documents(filter)).await?)
            }
            TotalEstimate::Known(total) => Some(total),
            TotalEstimate::Unknown => None,
        };

        tracing::debug!(
            "Found {} items in {} (total {:?})",
            items.len(),
            self.collection().name(),
            total
        );
        Ok(ItemList { total, items })
    }
}

#[async_trait]
impl Counter for MongoHandler {
    async fn count(&self, query: &Query) -> StorageResult<u64> {
        let filter = translate_predicate(&query.predicate)?;
        self.run(self.collection().count_documents(filter)).await
    }
}

#[async_trait]
impl Aggregator for MongoHandler {
    async fn aggregate(&self, query: &Query) -> StorageResult<Vec<GroupCount>> {
        let pipeline = aggregate_pipeline(query)?;
        let collection = self.collection();
        let groups = self
            .run(async move {
                collection
                    .aggregate(pipeline)
                    .await?
                    .try_collect::<Vec<Document>>()
                    .await
            })
            .await?;
        Ok(groups.into_iter().map(group_count).collect())
    }
}

fn group_count(mut group: Document) -> GroupCount {
    let key = group
        .remove(ID_KEY)
        .map(document::to_json)
        .unwrap_or(Value::Null);
    let total = match group.get("total") {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or_default(),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or_default(),
        _ => 0,
    };
    GroupCount { key, total }
}
