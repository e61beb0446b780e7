//! Aggregate specifications.

use serde::{Deserialize, Serialize};

/// Aggregate operator applied to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum AggregateOp {
    /// Group items by the field value and count each group.
    Group,
    /// Sum the field over matching items.
    Sum,
    /// Average the field over matching items.
    Avg,
}

/// One aggregated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateField {
    /// Target field.
    pub name: String,
    /// Operator applied to it.
    pub op: AggregateOp,
}

/// A group-by-and-count style aggregate specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate(pub Vec<AggregateField>);

impl Aggregate {
    /// Groups on a single field.
    pub fn group_by(field: impl Into<String>) -> Self {
        Self(vec![AggregateField {
            name: field.into(),
            op: AggregateOp::Group,
        }])
    }

    /// Returns the aggregated fields.
    pub fn fields(&self) -> &[AggregateField] {
        &self.0
    }
}

/// The count of items sharing one value of the grouped field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCount {
    /// The group key (`null` when the field is absent).
    pub key: serde_json::Value,
    /// Number of items in the group.
    pub total: u64,
}
