//! Pure view derivation over the canonical collection.
//!
//! # Responsibility
//! - Turn the raw collection into the sorted, filtered list consumers
//!   render.
//! - Keep the sort/filter vocabulary stable for boundary layers.
//!
//! # Invariants
//! - Derivation is side-effect free; the canonical collection is never
//!   reordered in place.
//! - Sort is applied before filter; filtering never re-sorts, so a filtered
//!   view is a subsequence of the sorted one.

use crate::model::task::Task;

/// Sort orders for the derived view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Descending `created_at`.
    #[default]
    Newest,
    /// Ascending `created_at`.
    Oldest,
    /// Ascending case-folded text, original text as tie-break.
    Alphabetical,
    /// Incomplete records first; descending `created_at` inside each group.
    /// Boundary layers label this "Active First".
    Completed,
}

impl SortOrder {
    /// Stable wire name of this order.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Alphabetical => "alphabetical",
            Self::Completed => "completed",
        }
    }

    /// Parses a wire name, `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "newest" => Some(Self::Newest),
            "oldest" => Some(Self::Oldest),
            "alphabetical" => Some(Self::Alphabetical),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Filters for the derived view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Pass every record.
    #[default]
    All,
    /// Retain completed records only.
    Completed,
}

impl FilterMode {
    /// Stable wire name of this filter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
        }
    }

    /// Parses a wire name, `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Derives the consumer-facing list: sort, then filter.
///
/// Sorts are stable, so records comparing equal keep their collection
/// order and repeated derivations are deterministic.
pub fn derive(tasks: &[Task], sort: SortOrder, filter: FilterMode) -> Vec<Task> {
    let mut view: Vec<Task> = tasks.to_vec();

    match sort {
        SortOrder::Newest => view.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Oldest => view.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::Alphabetical => view.sort_by(|a, b| {
            a.text
                .to_lowercase()
                .cmp(&b.text.to_lowercase())
                .then_with(|| a.text.cmp(&b.text))
        }),
        SortOrder::Completed => view.sort_by(|a, b| {
            a.completed
                .cmp(&b.completed)
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
    }

    match filter {
        FilterMode::All => {}
        FilterMode::Completed => view.retain(|task| task.completed),
    }

    view
}
