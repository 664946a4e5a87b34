//! Query controller
//!
//! Owns the active filters, page coordinates and sort order. Sorting is done
//! locally on the cached page, so it is not part of the cache key.

use std::cmp::Ordering;

use super::signature::{FilterPatch, FilterSignature, TaskFilter};
use crate::task::{CleaningTask, PageMeta};

/// Column a page can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Id,
    Room,
    Floor,
    RoomType,
    Priority,
    Assignee,
    StartedAt,
    FinishedAt,
    Status,
    Notes,
}

impl std::str::FromStr for SortKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "room" => Ok(Self::Room),
            "floor" => Ok(Self::Floor),
            "room_type" | "type" => Ok(Self::RoomType),
            "priority" => Ok(Self::Priority),
            "assignee" => Ok(Self::Assignee),
            "started_at" | "start" => Ok(Self::StartedAt),
            "finished_at" | "finish" => Ok(Self::FinishedAt),
            "status" => Ok(Self::Status),
            "notes" => Ok(Self::Notes),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown sort key: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// Loading state of the active signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing cached yet, a fetch is pending or about to start
    FirstLoad,
    /// Cached data is shown while a fetch is in flight
    Revalidating,
    /// Cached data is current and nothing is in flight
    Settled,
}

impl Freshness {
    pub fn derive(has_data: bool, in_flight: bool) -> Self {
        match (has_data, in_flight) {
            (false, _) => Self::FirstLoad,
            (true, true) => Self::Revalidating,
            (true, false) => Self::Settled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryController {
    filter: TaskFilter,
    page: u32,
    per_page: u32,
    sort: Option<SortSpec>,
}

impl QueryController {
    pub fn new(per_page: u32) -> Self {
        Self {
            filter: TaskFilter::default(),
            page: 1,
            per_page: per_page.max(1),
            sort: None,
        }
    }

    pub fn signature(&self) -> FilterSignature {
        FilterSignature::new(self.filter.clone(), self.page, self.per_page)
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    /// Merge `patch` into the filters. Always returns to page 1.
    pub fn set_filter(&mut self, patch: FilterPatch) -> FilterSignature {
        if let Some(per_page) = patch.per_page {
            self.per_page = per_page.max(1);
        }
        patch.merge_into(&mut self.filter);
        self.page = 1;
        self.signature()
    }

    /// Move to page `n` if it lies within the last fetched listing.
    /// Out-of-range requests are ignored and return `false`.
    pub fn goto_page(&mut self, n: u32, last_meta: Option<&PageMeta>) -> bool {
        match last_meta {
            Some(meta) if meta.contains_page(n) => {
                self.page = n;
                true
            }
            _ => false,
        }
    }

    /// Sort by `key`, flipping the direction when it is already the key
    pub fn set_sort(&mut self, key: SortKey) -> SortSpec {
        let spec = match self.sort {
            Some(current) if current.key == key => SortSpec {
                key,
                direction: match current.direction {
                    SortDirection::Asc => SortDirection::Desc,
                    SortDirection::Desc => SortDirection::Asc,
                },
            },
            _ => SortSpec {
                key,
                direction: SortDirection::Asc,
            },
        };
        self.sort = Some(spec);
        spec
    }

    /// Records in display order. Unsorted pages keep the server order.
    pub fn sorted(&self, records: &[CleaningTask]) -> Vec<CleaningTask> {
        let mut out = records.to_vec();
        if let Some(spec) = self.sort {
            out.sort_by(|a, b| {
                compare_values(
                    sort_value(a, spec.key).as_deref(),
                    sort_value(b, spec.key).as_deref(),
                    spec.direction,
                )
            });
        }
        out
    }
}

fn sort_value(task: &CleaningTask, key: SortKey) -> Option<String> {
    const TS: &str = "%Y-%m-%dT%H:%M:%S%.9f";
    match key {
        SortKey::Id => Some(task.id.to_string()),
        SortKey::Room => Some(task.room.number.clone()),
        SortKey::Floor => task.room.floor.map(|f| f.to_string()),
        SortKey::RoomType => task.room.type_name.clone(),
        SortKey::Priority => task.priority.map(|p| p.rank().to_string()),
        SortKey::Assignee => task.assignee.as_ref().map(|u| u.name.clone()),
        SortKey::StartedAt => Some(task.started_at.format(TS).to_string()),
        SortKey::FinishedAt => task.finished_at.map(|t| t.format(TS).to_string()),
        SortKey::Status => Some(task.status().name().to_string()),
        SortKey::Notes => task.notes.clone(),
    }
}

/// Missing values sort first in both directions. Two numeric values compare
/// numerically and sort ahead of text, text compares case-insensitively.
/// Grouping numbers before text keeps the order total on mixed columns.
fn compare_values(a: Option<&str>, b: Option<&str>, direction: SortDirection) -> Ordering {
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(a), Some(b)) => (a, b),
    };
    let ord = match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_text(a, b),
    };
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
