// External events and the pure `Current x Event -> Current'` function

use crate::fetch::Snapshot;
use crate::query::{DateRange, PageWindow, Sort};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    FilterAdded { key: String, value: String },
    FilterRemoved(usize),
    FiltersCleared,
    DateRangeChanged(DateRange),
    GridSortChanged(Sort),
    GridPageChanged(PageWindow),
    GridSearchChanged(String),
}

impl SyncEvent {
    /// Events that only concern the grid and leave the charts valid.
    pub const fn affects_grid_only(&self) -> bool {
        matches!(
            self,
            Self::GridSortChanged(_) | Self::GridPageChanged(_) | Self::GridSearchChanged(_)
        )
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilterAdded { key, value } => write!(f, "filter-added({key}={value})"),
            Self::FilterRemoved(index) => write!(f, "filter-removed({index})"),
            Self::FiltersCleared => write!(f, "filters-cleared"),
            Self::DateRangeChanged(range) => {
                write!(f, "date-range-changed({:?}..{:?})", range.start, range.end)
            }
            Self::GridSortChanged(sort) => write!(
                f,
                "grid-sort-changed({} {})",
                sort.column.as_str(),
                sort.direction.as_str()
            ),
            Self::GridPageChanged(page) => {
                write!(f, "grid-page-changed({}+{})", page.offset, page.size)
            }
            Self::GridSearchChanged(text) => write!(f, "grid-search-changed({text:?})"),
        }
    }
}

/// Applies `event` to `current`. Anything but a page change starts over
/// at the first page.
pub fn apply(current: &Snapshot, event: &SyncEvent) -> Snapshot {
    let mut next = current.clone();

    match event {
        SyncEvent::FilterAdded { key, value } => next.filters = current.filters.add(key, value),
        SyncEvent::FilterRemoved(index) => next.filters = current.filters.remove_at(*index),
        SyncEvent::FiltersCleared => next.filters = current.filters.clear(),
        SyncEvent::DateRangeChanged(range) => next.view.date_range = *range,
        SyncEvent::GridSortChanged(sort) => next.view.sort = *sort,
        SyncEvent::GridPageChanged(page) => {
            next.view.page = PageWindow {
                offset: page.offset,
                size: page.size.max(1),
            };
            return next;
        }
        SyncEvent::GridSearchChanged(text) => {
            let text = text.trim();
            next.view.search = (!text.is_empty()).then(|| text.to_string());
        }
    }

    if next != *current {
        next.view.page = next.view.page.first();
    }
    next
}
