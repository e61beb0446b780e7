//! MongoDB integration tests for the storage handler.
//!
//! These tests are opt-in via `RUN_MONGO_TESTS=1` and run against a
//! testcontainers-managed MongoDB instance. Set `MONGO_TEST_URI` to use an
//! already running server instead.

use chrono::{TimeZone, Utc};
use mongodb::bson::{Document, doc};
use rest_layer_mongo::{MongoConfig, MongoHandler};
use rest_layer_resource::query::{Aggregate, Expression, GroupCount, Query, Sort, Window};
use rest_layer_resource::{
    Aggregator, Backend, BackendCapability, Counter, Item, StorageError, Storer,
};
use serde_json::{Value, json};
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared MongoDB server reused across all tests in this binary.
struct SharedMongo {
    uri: String,
    /// Kept alive for the duration of the test binary; `None` for an external server.
    _container: Option<ContainerAsync<Mongo>>,
}

static SHARED_MONGO: OnceCell<SharedMongo> = OnceCell::const_new();

fn external_uri() -> Option<String> {
    std::env::var("MONGO_TEST_URI")
        .ok()
        .filter(|uri| !uri.trim().is_empty())
}

fn run_mongo_tests() -> bool {
    std::env::var("RUN_MONGO_TESTS").ok().as_deref() == Some("1") || external_uri().is_some()
}

fn skip_if_disabled(test_name: &str) -> bool {
    if run_mongo_tests() {
        return false;
    }
    eprintln!("skipping MongoDB test {test_name} (set RUN_MONGO_TESTS=1 to enable)");
    true
}

async fn shared_mongo() -> &'static SharedMongo {
    SHARED_MONGO
        .get_or_init(|| async {
            if let Some(uri) = external_uri() {
                return SharedMongo {
                    uri,
                    _container: None,
                };
            }

            let container = Mongo::default()
                .start()
                .await
                .expect("Failed to start MongoDB container");
            let host = container
                .get_host()
                .await
                .expect("Failed to get host")
                .to_string();
            let port = container
                .get_host_port_ipv4(27017)
                .await
                .expect("Failed to get host port");

            SharedMongo {
                uri: format!("mongodb://{host}:{port}"),
                _container: Some(container),
            }
        })
        .await
}

/// Creates a handler on a fresh database so tests never share state.
async fn make_handler(collection: &str) -> MongoHandler {
    let database = format!("rest_layer_{}", Uuid::new_v4().simple());
    handler_in(&database, collection).await
}

/// Returns a handler on another collection of the same database.
async fn sibling(handler: &MongoHandler, collection: &str) -> MongoHandler {
    handler_in(&handler.collection().namespace().db, collection).await
}

async fn handler_in(database: &str, collection: &str) -> MongoHandler {
    let shared = shared_mongo().await;
    let config = MongoConfig::new(database, collection)
        .with_uri(shared.uri.clone())
        .with_request_timeout_ms(10_000);
    MongoHandler::connect(config)
        .await
        .expect("Failed to create MongoHandler")
}

fn now() -> chrono::DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
}

fn item(id: &str, etag: &str, fields: Value) -> Item {
    let mut item = Item::new(id, etag, now()).with_field("id", json!(id));
    if let Value::Object(map) = fields {
        item.payload.extend(map);
    }
    item
}

fn named(id: &str, name: &str) -> Item {
    item(id, "", json!({"name": name}))
}

async fn stored(handler: &MongoHandler, id: &str) -> Option<Document> {
    handler
        .collection()
        .find_one(doc! { "_id": id })
        .await
        .unwrap()
}

async fn stored_ids(handler: &MongoHandler) -> Vec<String> {
    let list = handler
        .find(&Query::new().with_sort(Sort::parse("id")))
        .await
        .unwrap();
    list.items.into_iter().map(|item| item.id).collect()
}

fn in_names(names: &[&str]) -> Expression {
    Expression::is_in("name", names.iter().copied())
}

// ============================================================================
// Insert
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_insert_stores_reserved_fields() {
    if skip_if_disabled("test_insert_stores_reserved_fields") {
        return;
    }
    let handler = make_handler("test").await;
    let items = vec![item("1234", "etag", json!({"foo": "bar"}))];

    handler.insert(&items).await.unwrap();

    let document = stored(&handler, "1234").await.unwrap();
    assert_eq!(
        document,
        doc! {
            "_id": "1234",
            "foo": "bar",
            "_etag": "etag",
            "_updated": mongodb::bson::DateTime::from_millis(1_700_000_000_123),
        }
    );

    // Inserting the same item twice is a conflict
    let err = handler.insert(&items).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(matches!(
        err,
        StorageError::Resource(rest_layer_resource::ResourceError::AlreadyExists { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_insert_empty_batch() {
    if skip_if_disabled("test_insert_empty_batch") {
        return;
    }
    let handler = make_handler("test").await;

    handler.insert(&[]).await.unwrap();
    assert_eq!(handler.count(&Query::new()).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_insert_batch_stops_at_conflict() {
    if skip_if_disabled("test_insert_batch_stops_at_conflict") {
        return;
    }
    let handler = make_handler("test").await;
    handler.insert(&[named("2", "b")]).await.unwrap();

    let batch = vec![named("1", "a"), named("2", "b"), named("3", "c")];
    let err = handler.insert(&batch).await.unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(stored_ids(&handler).await, vec!["1", "2"]);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_update() {
    if skip_if_disabled("test_update") {
        return;
    }
    let handler = make_handler("test").await;
    let old_item = item("1234", "etag1", json!({"foo": "bar"}));
    let new_item = item("1234", "etag2", json!({"foo": "baz"}));

    // Can't update a non existing item
    let err = handler.update(&new_item, &old_item).await.unwrap_err();
    assert!(err.is_not_found());

    handler.insert(&[old_item.clone()]).await.unwrap();
    handler.update(&new_item, &old_item).await.unwrap();

    let document = stored(&handler, "1234").await.unwrap();
    assert_eq!(document.get_str("foo").unwrap(), "baz");
    assert_eq!(document.get_str("_etag").unwrap(), "etag2");

    // The stored ETag no longer matches the original
    let err = handler.update(&new_item, &old_item).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(!err.is_not_found());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_update_legacy_record() {
    if skip_if_disabled("test_update_legacy_record") {
        return;
    }
    let handler = make_handler("test").await;
    let legacy = sibling(&handler, "testEtag").await;
    legacy
        .collection()
        .insert_one(doc! { "_id": "1234", "foo": "bar" })
        .await
        .unwrap();

    // A record without _etag is read with a synthesized ETag
    let found = legacy.find(&Query::new()).await.unwrap();
    let original = found.items[0].clone();
    assert_eq!(original.etag, "p-1234");

    let item = item("1234", "etag", json!({"foo": "baz"}));
    legacy.update(&item, &original).await.unwrap();

    let document = stored(&legacy, "1234").await.unwrap();
    assert_eq!(
        document,
        doc! {
            "_id": "1234",
            "foo": "baz",
            "_etag": "etag",
            "_updated": mongodb::bson::DateTime::from_millis(1_700_000_000_123),
        }
    );

    // The synthesized ETag only matches once
    let err = legacy.update(&item, &original).await.unwrap_err();
    assert!(err.is_conflict());
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete() {
    if skip_if_disabled("test_delete") {
        return;
    }
    let handler = make_handler("test").await;
    let mut item = item("1234", "etag1", json!({"foo": "bar"}));

    // Can't delete a non existing item
    let err = handler.delete(&item).await.unwrap_err();
    assert!(err.is_not_found());

    handler.insert(&[item.clone()]).await.unwrap();
    handler.delete(&item).await.unwrap();
    assert!(stored(&handler, "1234").await.is_none());

    // Delete refused if the ETag doesn't match the stored one
    handler.insert(&[item.clone()]).await.unwrap();
    item.etag = "etag2".to_string();
    let err = handler.delete(&item).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(stored(&handler, "1234").await.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete_legacy_record() {
    if skip_if_disabled("test_delete_legacy_record") {
        return;
    }
    let handler = make_handler("test").await;
    let legacy = sibling(&handler, "testEtag").await;
    legacy
        .collection()
        .insert_many([
            doc! { "_id": "1234", "foo": "bar" },
            doc! { "_id": "12345", "foo": "bar", "_etag": "etag" },
        ])
        .await
        .unwrap();

    let mut original = item("1234", "p-1234", json!({"foo": "baz"}));
    legacy.delete(&original).await.unwrap();
    assert!(stored(&legacy, "1234").await.is_none());

    // A synthesized ETag does not match a record with _etag
    original.id = "12345".to_string();
    original.etag = "p-12345".to_string();
    let err = legacy.delete(&original).await.unwrap_err();
    assert!(err.is_conflict());
}

// ============================================================================
// Concurrent writers
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_updates_single_winner() {
    if skip_if_disabled("test_concurrent_updates_single_winner") {
        return;
    }
    let handler = make_handler("test").await;
    let original = item("1234", "etag1", json!({"foo": "bar"}));
    handler.insert(&[original.clone()]).await.unwrap();

    let left = item("1234", "etag-left", json!({"foo": "left"}));
    let right = item("1234", "etag-right", json!({"foo": "right"}));
    let (a, b) = tokio::join!(
        handler.update(&left, &original),
        handler.update(&right, &original)
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(loser.is_conflict());

    // The stored ETag is the winner's
    let winner = if results[0].is_ok() { &left } else { &right };
    let document = stored(&handler, "1234").await.unwrap();
    assert_eq!(document.get_str("_etag").unwrap(), winner.etag);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_deletes_single_winner() {
    if skip_if_disabled("test_concurrent_deletes_single_winner") {
        return;
    }
    let handler = make_handler("test").await;
    let original = item("1234", "etag1", json!({"foo": "bar"}));
    handler.insert(&[original.clone()]).await.unwrap();

    let (a, b) = tokio::join!(handler.delete(&original), handler.delete(&original));

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    // The loser sees the item already gone
    assert!(loser.is_not_found());
    assert!(stored(&handler, "1234").await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_update_races_delete() {
    if skip_if_disabled("test_update_races_delete") {
        return;
    }
    let handler = make_handler("test").await;
    let original = item("1234", "etag1", json!({"foo": "bar"}));
    handler.insert(&[original.clone()]).await.unwrap();

    let replacement = item("1234", "etag2", json!({"foo": "baz"}));
    let (updated, deleted) = tokio::join!(
        handler.update(&replacement, &original),
        handler.delete(&original)
    );

    match (updated, deleted) {
        (Ok(()), Err(e)) => assert!(e.is_conflict()),
        (Err(e), Ok(())) => assert!(e.is_not_found()),
        other => panic!("expected exactly one winner, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_non_string_etag_is_legacy() {
    if skip_if_disabled("test_non_string_etag_is_legacy") {
        return;
    }
    let handler = make_handler("test").await;
    handler
        .collection()
        .insert_one(doc! { "_id": "7", "name": "g", "_etag": 5 })
        .await
        .unwrap();

    let original = handler.find(&Query::new()).await.unwrap().items[0].clone();
    assert_eq!(original.etag, "p-7");

    let replacement = item("7", "etag1", json!({"name": "g"}));
    handler.update(&replacement, &original).await.unwrap();
    let document = stored(&handler, "7").await.unwrap();
    assert_eq!(document.get_str("_etag").unwrap(), "etag1");
}

// ============================================================================
// Clear
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_clear() {
    if skip_if_disabled("test_clear") {
        return;
    }
    let handler = make_handler("test").await;
    handler
        .insert(&[
            named("1", "a"),
            named("2", "b"),
            named("3", "c"),
            named("4", "d"),
        ])
        .await
        .unwrap();

    let deleted = handler
        .clear(&Query::new().with_predicate(in_names(&["c", "d"])))
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(stored_ids(&handler).await, vec!["1", "2"]);

    let deleted = handler
        .clear(&Query::new().with_predicate(Expression::eq("id", "2")))
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(stored_ids(&handler).await, vec!["1"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_clear_limit() {
    if skip_if_disabled("test_clear_limit") {
        return;
    }
    let handler = make_handler("test").await;
    handler
        .insert(&[
            named("1", "a"),
            named("2", "b"),
            named("3", "d"), // sorted after 4
            named("4", "c"), // removed
        ])
        .await
        .unwrap();

    let query = Query::new()
        .with_predicate(in_names(&["c", "d"]))
        .with_sort(Sort::parse("name"))
        .with_window(Window::new(0, 1));
    assert_eq!(handler.clear(&query).await.unwrap(), 1);
    assert_eq!(stored_ids(&handler).await, vec!["1", "2", "3"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_clear_offset() {
    if skip_if_disabled("test_clear_offset") {
        return;
    }
    let handler = make_handler("test").await;
    handler
        .insert(&[
            named("1", "a"),
            named("2", "b"),
            named("3", "d"), // sorted after 4, removed
            named("4", "c"), // skipped
        ])
        .await
        .unwrap();

    // A zero limit in a clear window means everything after the offset
    let query = Query::new()
        .with_predicate(in_names(&["c", "d"]))
        .with_sort(Sort::parse("name"))
        .with_window(Window::new(1, 0));
    assert_eq!(handler.clear(&query).await.unwrap(), 1);
    assert_eq!(stored_ids(&handler).await, vec!["1", "2", "4"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_clear_window_past_end() {
    if skip_if_disabled("test_clear_window_past_end") {
        return;
    }
    let handler = make_handler("test").await;
    handler.insert(&[named("1", "a")]).await.unwrap();

    let query = Query::new().with_window(Window::from_offset(5));
    assert_eq!(handler.clear(&query).await.unwrap(), 0);
    assert_eq!(stored_ids(&handler).await, vec!["1"]);
}

// ============================================================================
// Find
// ============================================================================

async fn find_fixture() -> MongoHandler {
    let handler = make_handler("test").await;
    let items = vec![
        item("1", "", json!({"name": "a", "age": 1})),
        item("2", "", json!({"name": "b", "age": 2})),
        item("3", "", json!({"name": "c", "age": 3})),
        item("4", "", json!({"name": "d", "age": 4})),
        item("5", "", json!({"name": "rest-layer-regexp"})),
    ];
    handler.insert(&items).await.unwrap();

    // Same items in another collection must not leak into results
    sibling(&handler, "test2")
        .await
        .insert(&items)
        .await
        .unwrap();
    handler
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_find_totals() {
    if skip_if_disabled("test_find_totals") {
        return;
    }
    let handler = find_fixture().await;

    let list = handler.find(&Query::new()).await.unwrap();
    assert_eq!(list.total, Some(5));
    assert_eq!(list.items.len(), 5);

    let list = handler
        .find(&Query::new().with_window(Window::new(0, 0)))
        .await
        .unwrap();
    assert_eq!(list.total, Some(5));
    assert!(list.items.is_empty());

    let list = handler
        .find(&Query::new().with_window(Window::from_offset(2)))
        .await
        .unwrap();
    assert_eq!(list.total, Some(5));
    assert_eq!(list.items.len(), 3);

    for offset in [5, 6] {
        let list = handler
            .find(&Query::new().with_window(Window::from_offset(offset)))
            .await
            .unwrap();
        assert_eq!(list.total_or_unknown(), -1);
        assert!(list.items.is_empty());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_find_single_page() {
    if skip_if_disabled("test_find_single_page") {
        return;
    }
    let handler = find_fixture().await;

    for predicate in [Expression::eq("name", "c"), Expression::eq("id", "3")] {
        let query = Query::new()
            .with_predicate(predicate)
            .with_window(Window::page(1, 1, 0));
        let list = handler.find(&query).await.unwrap();

        assert_eq!(list.total, None);
        assert_eq!(list.items.len(), 1);
        let item = &list.items[0];
        assert_eq!(item.id, "3");
        assert_eq!(item.etag, "p-3");
        assert_eq!(
            Value::Object(item.payload.clone()),
            json!({"id": "3", "name": "c", "age": 3})
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_find_sorted_membership() {
    if skip_if_disabled("test_find_sorted_membership") {
        return;
    }
    let handler = find_fixture().await;

    let query = Query::new()
        .with_predicate(in_names(&["c", "d"]))
        .with_sort(Sort::parse("name"))
        .with_window(Window::page(1, 100, 0));
    let list = handler.find(&query).await.unwrap();

    assert_eq!(list.total, Some(2));
    let ids: Vec<&str> = list.items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "4"]);
    assert_eq!(
        Value::Object(list.items[1].payload.clone()),
        json!({"id": "4", "name": "d", "age": 4})
    );

    let query = Query::new().with_predicate(Expression::is_in("id", ["3", "4", "10"]));
    let list = handler.find(&query).await.unwrap();
    assert_eq!(list.total, Some(2));
    assert_eq!(list.items.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_find_regex_and_missing() {
    if skip_if_disabled("test_find_regex_and_missing") {
        return;
    }
    let handler = find_fixture().await;

    let query = Query::new()
        .with_predicate(Expression::regex("name", "^re[s]{1}t-.+yer.+exp$").unwrap())
        .with_window(Window::page(1, 1, 0));
    let list = handler.find(&query).await.unwrap();
    assert_eq!(list.total, None);
    assert_eq!(list.items.len(), 1);
    assert_eq!(
        Value::Object(list.items[0].payload.clone()),
        json!({"id": "5", "name": "rest-layer-regexp"})
    );

    let query = Query::new()
        .with_predicate(Expression::eq("id", "10"))
        .with_window(Window::page(1, 1, 0));
    let list = handler.find(&query).await.unwrap();
    assert_eq!(list.total, Some(0));
    assert!(list.items.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_find_unsupported_predicate() {
    if skip_if_disabled("test_find_unsupported_predicate") {
        return;
    }
    let handler = find_fixture().await;

    let query = Query::new().with_predicate(Expression::ElemMatch {
        field: "tags".to_string(),
        expressions: vec![Expression::eq("name", "x")],
    });
    assert!(handler.find(&query).await.unwrap_err().is_not_implemented());
    assert!(handler.clear(&query).await.unwrap_err().is_not_implemented());
    assert_eq!(handler.count(&Query::new()).await.unwrap(), 5);
}

// ============================================================================
// Count, aggregate and backend
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_count() {
    if skip_if_disabled("test_count") {
        return;
    }
    let handler = find_fixture().await;

    assert_eq!(handler.count(&Query::new()).await.unwrap(), 5);
    let query = Query::new().with_predicate(Expression::gte("age", 3));
    assert_eq!(handler.count(&query).await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_aggregate_group_count() {
    if skip_if_disabled("test_aggregate_group_count") {
        return;
    }
    let handler = make_handler("test").await;
    handler
        .insert(&[
            named("1", "a"),
            named("2", "b"),
            named("3", "a"),
            item("4", "", json!({"age": 4})),
        ])
        .await
        .unwrap();

    let query = Query::new()
        .with_predicate(Expression::exists("name"))
        .with_aggregate(Aggregate::group_by("name"));
    let groups = handler.aggregate(&query).await.unwrap();
    assert_eq!(
        groups,
        vec![
            GroupCount {
                key: json!("a"),
                total: 2,
            },
            GroupCount {
                key: json!("b"),
                total: 1,
            },
        ]
    );

    let err = handler.aggregate(&Query::new()).await.unwrap_err();
    assert!(err.is_not_implemented());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_backend_health_check() {
    if skip_if_disabled("test_backend_health_check") {
        return;
    }
    let handler = make_handler("test").await;

    assert_eq!(handler.name(), "mongodb");
    assert!(handler.supports(BackendCapability::OptimisticLocking));
    assert!(handler.supports(BackendCapability::WindowedClear));
    handler.health_check().await.unwrap();
}
