//! Query model.
//!
//! A [`Query`] bundles a [`Predicate`], a [`Sort`], an optional [`Window`] and
//! an optional [`Aggregate`]. Queries are built per call and carry no state.
//!
//! ```
//! use rest_layer_resource::query::{Expression, Query, Sort, Window};
//!
//! let query = Query::new()
//!     .with_predicate(Expression::is_in("name", ["c", "d"]))
//!     .with_sort(Sort::parse("name"))
//!     .with_window(Window::new(0, 1));
//!
//! assert_eq!(query.window.unwrap().limit, 1);
//! ```

mod aggregate;
mod predicate;
mod sort;
mod window;

pub use aggregate::{Aggregate, AggregateField, AggregateOp, GroupCount};
pub use predicate::{Expression, Pattern, Predicate};
pub use sort::{Sort, SortField};
pub use window::Window;

/// A storage query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Which items match.
    pub predicate: Predicate,
    /// Result ordering.
    pub sort: Sort,
    /// Pagination; `None` means no restriction.
    pub window: Option<Window>,
    /// Optional group-by aggregate.
    pub aggregate: Option<Aggregate>,
}

impl Query {
    /// Creates a query matching every item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the predicate.
    pub fn with_predicate(mut self, predicate: impl Into<Predicate>) -> Self {
        self.predicate = predicate.into();
        self
    }

    /// Sets the sort.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the window.
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    /// Sets the aggregate.
    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }
}
