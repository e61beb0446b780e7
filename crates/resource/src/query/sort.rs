//! Sort specifications.

use serde::{Deserialize, Serialize};

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Field to sort on.
    pub name: String,
    /// Sort descending when true.
    #[serde(default)]
    pub reversed: bool,
}

impl SortField {
    /// Ascending sort on `name`.
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reversed: false,
        }
    }

    /// Descending sort on `name`.
    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reversed: true,
        }
    }
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort(pub Vec<SortField>);

impl Sort {
    /// Parses a comma separated sort string such as `"name,-age"`.
    ///
    /// Empty segments are ignored.
    pub fn parse(spec: &str) -> Self {
        Self(
            spec.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| match s.strip_prefix('-') {
                    Some(name) => SortField::desc(name),
                    None => SortField::asc(s),
                })
                .collect(),
        )
    }

    /// Returns true when no sort key is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the sort keys.
    pub fn iter(&self) -> std::slice::Iter<'_, SortField> {
        self.0.iter()
    }
}
