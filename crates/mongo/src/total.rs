//! Total estimation for find results.
//!
//! A find only pays for a separate count when the returned page cannot tell
//! the total on its own. The decision depends on the window and on how many
//! items came back:
//!
//! | Window | Returned | Total |
//! |--------|----------|-------|
//! | none | any | counted |
//! | `limit == 0` | none (no fetch) | counted |
//! | `limit < 0` | `n > 0` | `offset + n` |
//! | `limit < 0` | `0` | unknown |
//! | `limit > 0` | `n < limit` | `offset + n` |
//! | `limit > 0` | `n == limit` | unknown |
//!
//! An empty uncapped page is ambiguous: the offset may lie past the end of a
//! non-empty set, so the total is left unknown rather than guessed.
//!
//! A short capped page always yields `offset + n`, even when it is empty and
//! the offset overshoots the set; hosts rely on that value for paging.

use rest_layer_resource::query::Window;

/// How a find obtains its total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalEstimate {
    /// Run a count on the predicate.
    Count,
    /// The total follows from the returned page.
    Known(u64),
    /// Report the total as unknown.
    Unknown,
}

/// Decides the total of a find that returned `returned` items.
pub fn estimate_total(window: Option<&Window>, returned: usize) -> TotalEstimate {
    let Some(window) = window else {
        return TotalEstimate::Count;
    };
    let returned = returned as u64;
    let known = TotalEstimate::Known(window.offset.saturating_add(returned));
    match window.max_items() {
        _ if window.is_count_probe() => TotalEstimate::Count,
        None if returned > 0 => known,
        None => TotalEstimate::Unknown,
        Some(limit) if returned < limit => known,
        Some(_) => TotalEstimate::Unknown,
    }
}
