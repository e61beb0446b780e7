//! Aggregate translation.

use mongodb::bson::{Document, doc};
use rest_layer_resource::query::{Aggregate, AggregateOp};
use rest_layer_resource::{Query, QueryError, QueryResult};

use super::{native_field, translate_predicate};
use crate::document::ID_KEY;

/// Translates a group-by aggregate into a `$group` stage body.
///
/// Only a single grouped field is supported; it yields
/// `{_id: "$field", total: {$sum: 1}}`.
///
/// # Errors
///
/// * `QueryError::UnsupportedAggregate` - For any other shape
pub fn translate_aggregate(aggregate: &Aggregate) -> QueryResult<Document> {
    match aggregate.fields() {
        [field] if field.op == AggregateOp::Group => Ok(doc! {
            ID_KEY: format!("${}", native_field(&field.name)),
            "total": { "$sum": 1 },
        }),
        [field] => Err(QueryError::UnsupportedAggregate {
            message: format!("{:?} on {}", field.op, field.name),
        }),
        fields => Err(QueryError::UnsupportedAggregate {
            message: format!("expected one grouped field, got {}", fields.len()),
        }),
    }
}

/// Builds the `[$match, $group, $sort]` pipeline evaluating a query's
/// aggregate. Groups are ordered by key.
///
/// # Errors
///
/// * `QueryError::UnsupportedAggregate` - If the query has no aggregate or an
///   unsupported one
/// * `QueryError::UnsupportedExpression` - If the predicate cannot be expressed
pub fn aggregate_pipeline(query: &Query) -> QueryResult<Vec<Document>> {
    let aggregate = query
        .aggregate
        .as_ref()
        .ok_or_else(|| QueryError::UnsupportedAggregate {
            message: "query has no aggregate".to_string(),
        })?;
    let group = translate_aggregate(aggregate)?;
    let filter = translate_predicate(&query.predicate)?;

    Ok(vec![
        doc! { "$match": filter },
        doc! { "$group": group },
        doc! { "$sort": { ID_KEY: 1 } },
    ])
}
