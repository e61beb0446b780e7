//! Sort translation.

use mongodb::bson::Document;
use rest_layer_resource::Query;

use super::native_field;
use crate::document::ID_KEY;

/// Returns the stored sort keys of a query, `-` prefixed when descending.
///
/// An empty sort falls back to `_id` so that windows are stable.
pub fn sort_fields(query: &Query) -> Vec<String> {
    if query.sort.is_empty() {
        return vec![ID_KEY.to_string()];
    }
    query
        .sort
        .iter()
        .map(|field| {
            let name = native_field(&field.name);
            if field.reversed {
                format!("-{name}")
            } else {
                name.to_string()
            }
        })
        .collect()
}

/// Builds a driver sort document from keys produced by [`sort_fields`].
pub fn sort_document(fields: &[String]) -> Document {
    let mut document = Document::new();
    for field in fields {
        match field.strip_prefix('-') {
            Some(name) => document.insert(name, -1),
            None => document.insert(field.as_str(), 1),
        };
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use rest_layer_resource::query::{Sort, SortField};

    fn fields(sort: Sort) -> Vec<String> {
        sort_fields(&Query::new().with_sort(sort))
    }

    #[test]
    fn test_sort_fields() {
        assert_eq!(fields(Sort::default()), vec!["_id"]);
        assert_eq!(fields(Sort(vec![SortField::asc("id")])), vec!["_id"]);
        assert_eq!(fields(Sort(vec![SortField::asc("f")])), vec!["f"]);
        assert_eq!(fields(Sort(vec![SortField::desc("f")])), vec!["-f"]);
        assert_eq!(
            fields(Sort(vec![SortField::asc("f"), SortField::desc("f")])),
            vec!["f", "-f"]
        );
    }

    #[test]
    fn test_sort_document() {
        let keys = fields(Sort::parse("name,-age,id"));
        assert_eq!(
            sort_document(&keys),
            doc! { "name": 1, "age": -1, "_id": 1 }
        );
    }
}
