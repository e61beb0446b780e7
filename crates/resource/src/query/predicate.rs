//! Predicate expression trees.
//!
//! A [`Predicate`] is a list of [`Expression`]s combined with an implicit
//! AND. Expressions are a closed set of comparison, membership, existence and
//! pattern operators plus the `$and`/`$or` combinators. The enum is
//! `#[non_exhaustive]`: handlers must treat unknown kinds as not implemented.

// Variant fields are named after the operand they hold
#![allow(missing_docs)]

use std::fmt;

use regex::Regex;
use serde_json::Value;

/// A boolean expression tree describing which items match a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate(pub Vec<Expression>);

impl Predicate {
    /// Creates a predicate from its top-level expressions.
    pub fn new(expressions: Vec<Expression>) -> Self {
        Self(expressions)
    }

    /// Returns true when the predicate matches everything.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the top-level expressions.
    pub fn expressions(&self) -> &[Expression] {
        &self.0
    }
}

impl From<Expression> for Predicate {
    fn from(expr: Expression) -> Self {
        Self(vec![expr])
    }
}

/// A single node of a predicate.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Expression {
    /// All sub-expressions must match.
    And(Vec<Expression>),
    /// At least one sub-expression must match.
    Or(Vec<Expression>),
    /// Field equals value.
    Equal { field: String, value: Value },
    /// Field differs from value.
    NotEqual { field: String, value: Value },
    /// Field is strictly greater than value.
    GreaterThan { field: String, value: Value },
    /// Field is greater than or equal to value.
    GreaterOrEqual { field: String, value: Value },
    /// Field is strictly lower than value.
    LowerThan { field: String, value: Value },
    /// Field is lower than or equal to value.
    LowerOrEqual { field: String, value: Value },
    /// Field equals one of the values.
    In { field: String, values: Vec<Value> },
    /// Field equals none of the values.
    NotIn { field: String, values: Vec<Value> },
    /// Field is present.
    Exist { field: String },
    /// Field is absent.
    NotExist { field: String },
    /// Field matches a regular expression.
    Regex { field: String, pattern: Pattern },
    /// At least one element of an array field matches all sub-expressions.
    ElemMatch {
        field: String,
        expressions: Vec<Expression>,
    },
}

impl Expression {
    /// Builds an equality expression.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expression::Equal {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds an inequality expression.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expression::NotEqual {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a `>` expression.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expression::GreaterThan {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a `>=` expression.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expression::GreaterOrEqual {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a `<` expression.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expression::LowerThan {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a `<=` expression.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expression::LowerOrEqual {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a set membership expression.
    pub fn is_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Expression::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a set exclusion expression.
    pub fn not_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Expression::NotIn {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a field existence expression.
    pub fn exists(field: impl Into<String>) -> Self {
        Expression::Exist {
            field: field.into(),
        }
    }

    /// Builds a field absence expression.
    pub fn not_exists(field: impl Into<String>) -> Self {
        Expression::NotExist {
            field: field.into(),
        }
    }

    /// Builds a regular expression match.
    ///
    /// # Errors
    ///
    /// Returns the compile error when `pattern` is not a valid regex.
    pub fn regex(field: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Expression::Regex {
            field: field.into(),
            pattern: Pattern::new(pattern)?,
        })
    }

    /// Returns the operator name of this node, as written in the host's query
    /// language.
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::And(_) => "$and",
            Expression::Or(_) => "$or",
            Expression::Equal { .. } => "$eq",
            Expression::NotEqual { .. } => "$ne",
            Expression::GreaterThan { .. } => "$gt",
            Expression::GreaterOrEqual { .. } => "$gte",
            Expression::LowerThan { .. } => "$lt",
            Expression::LowerOrEqual { .. } => "$lte",
            Expression::In { .. } => "$in",
            Expression::NotIn { .. } => "$nin",
            Expression::Exist { .. } => "$exists",
            Expression::NotExist { .. } => "$exists",
            Expression::Regex { .. } => "$regex",
            Expression::ElemMatch { .. } => "$elemMatch",
        }
    }
}

/// A compiled regular expression that compares by its source pattern.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles a pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    /// Returns the source pattern.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
