//! Pagination windows.

use serde::{Deserialize, Serialize};

/// A pagination descriptor.
///
/// The limit carries sentinel meanings:
///
/// - `limit == 0`: return no items, only the total (a count probe)
/// - `limit < 0`: no cap, return everything from `offset` on
/// - `limit > 0`: return at most `limit` items
///
/// A query without a window is not the same as a zero limit: it means "no
/// restriction at all".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Number of matching items to skip.
    pub offset: u64,
    /// Maximum number of items to return (see sentinels above).
    pub limit: i64,
}

impl Window {
    /// Creates a window.
    pub fn new(offset: u64, limit: i64) -> Self {
        Self { offset, limit }
    }

    /// Creates an uncapped window starting at `offset`.
    pub fn from_offset(offset: u64) -> Self {
        Self { offset, limit: -1 }
    }

    /// Creates a window for a 1-based page of `per_page` items, shifted by
    /// `skip` additional items.
    pub fn page(page: u64, per_page: u64, skip: u64) -> Self {
        let offset = page
            .saturating_sub(1)
            .saturating_mul(per_page)
            .saturating_add(skip);
        Self {
            offset,
            limit: i64::try_from(per_page).unwrap_or(i64::MAX),
        }
    }

    /// Returns true when the window asks for the total only.
    pub fn is_count_probe(&self) -> bool {
        self.limit == 0
    }

    /// Returns the page size cap, or `None` when uncapped.
    pub fn max_items(&self) -> Option<u64> {
        u64::try_from(self.limit).ok().filter(|l| *l > 0)
    }
}
