//! Predicate translation.
//!
//! Translates a [`Predicate`] into a MongoDB filter document.
//!
//! | Expression | Filter |
//! |------------|--------|
//! | `Equal` | `{f: v}` |
//! | `NotEqual` | `{f: {$ne: v}}` |
//! | `GreaterThan` / `GreaterOrEqual` | `{f: {$gt: v}}` / `{f: {$gte: v}}` |
//! | `LowerThan` / `LowerOrEqual` | `{f: {$lt: v}}` / `{f: {$lte: v}}` |
//! | `In` / `NotIn` | `{f: {$in: [..]}}` / `{f: {$nin: [..]}}` |
//! | `Exist` / `NotExist` | `{f: {$exists: true}}` / `{f: {$exists: false}}` |
//! | `Regex` | `{f: {$regex: "pattern"}}` |
//! | `And` / `Or` | `{$and: [..]}` / `{$or: [..]}` |
//!
//! The `id` field is rewritten to `_id`. Numbers are sent as doubles.

use mongodb::bson::{Bson, Document, doc};
use rest_layer_resource::query::{Expression, Predicate};
use rest_layer_resource::{QueryError, QueryResult};
use serde_json::Value;

use super::native_field;

/// Translates a predicate into a filter document.
///
/// Top-level expressions are implicitly ANDed: their documents are merged
/// when they use distinct keys, and wrapped in `$and` otherwise.
///
/// # Errors
///
/// * `QueryError::UnsupportedExpression` - If any node, at any depth, has a
///   kind outside the supported operators
pub fn translate_predicate(predicate: &Predicate) -> QueryResult<Document> {
    match predicate.expressions() {
        [] => Ok(Document::new()),
        [single] => translate_expression(single),
        many => {
            let parts = many
                .iter()
                .map(translate_expression)
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(merge_or_and(parts))
        }
    }
}

/// Translates a single expression node.
pub fn translate_expression(expr: &Expression) -> QueryResult<Document> {
    match expr {
        Expression::And(children) => {
            let children = translate_children(children)?;
            Ok(doc! { "$and": children })
        }
        Expression::Or(children) => {
            let children = translate_children(children)?;
            Ok(doc! { "$or": children })
        }
        Expression::Equal { field, value } => Ok(field_document(field, literal(value))),
        Expression::NotEqual { field, value } => Ok(operator(field, "$ne", literal(value))),
        Expression::GreaterThan { field, value } => Ok(operator(field, "$gt", literal(value))),
        Expression::GreaterOrEqual { field, value } => {
            Ok(operator(field, "$gte", literal(value)))
        }
        Expression::LowerThan { field, value } => Ok(operator(field, "$lt", literal(value))),
        Expression::LowerOrEqual { field, value } => Ok(operator(field, "$lte", literal(value))),
        Expression::In { field, values } => Ok(operator(field, "$in", literals(values))),
        Expression::NotIn { field, values } => Ok(operator(field, "$nin", literals(values))),
        Expression::Exist { field } => Ok(operator(field, "$exists", true)),
        Expression::NotExist { field } => Ok(operator(field, "$exists", false)),
        Expression::Regex { field, pattern } => Ok(operator(field, "$regex", pattern.as_str())),
        other => Err(QueryError::UnsupportedExpression {
            kind: other.kind().to_string(),
        }),
    }
}

fn translate_children(children: &[Expression]) -> QueryResult<Vec<Bson>> {
    children
        .iter()
        .map(|child| translate_expression(child).map(Bson::Document))
        .collect()
}

fn merge_or_and(parts: Vec<Document>) -> Document {
    let distinct = {
        let mut seen = std::collections::HashSet::new();
        parts.iter().flat_map(Document::keys).all(|k| seen.insert(k))
    };
    if distinct {
        parts.into_iter().flatten().collect()
    } else {
        doc! { "$and": parts }
    }
}

fn field_document(field: &str, value: impl Into<Bson>) -> Document {
    let mut document = Document::new();
    document.insert(native_field(field), value);
    document
}

fn operator(field: &str, op: &str, value: impl Into<Bson>) -> Document {
    let mut condition = Document::new();
    condition.insert(op, value);
    field_document(field, condition)
}

fn literals(values: &[Value]) -> Vec<Bson> {
    values.iter().map(literal).collect()
}

/// Converts a query literal to BSON. Every number becomes a double.
fn literal(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(values) => Bson::Array(literals(values)),
        Value::Object(map) => Bson::Document(
            map.iter()
                .map(|(k, v)| (k.clone(), literal(v)))
                .collect(),
        ),
    }
}
