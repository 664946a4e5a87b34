//! Filter signatures
//!
//! A [`FilterSignature`] is the structural key of a cached page: the filters
//! plus the page coordinates that produced it.

use std::fmt;

use chrono::NaiveDate;

use crate::task::Priority;

/// Inclusive date window on the task start date
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }
}

/// Server-side filters for the task listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TaskFilter {
    pub priority: Option<Priority>,
    /// Only tasks without `finished_at`
    pub pending_only: bool,
    pub room_id: Option<u64>,
    pub status_id: Option<u64>,
    pub date_range: DateRange,
}

/// Partial update to a [`TaskFilter`]. Unset fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct FilterPatch {
    pub priority: Option<Option<Priority>>,
    pub pending_only: Option<bool>,
    pub room_id: Option<Option<u64>>,
    pub status_id: Option<Option<u64>>,
    pub date_range: Option<DateRange>,
    pub per_page: Option<u32>,
}

impl FilterPatch {
    pub fn priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn pending_only(mut self, pending_only: bool) -> Self {
        self.pending_only = Some(pending_only);
        self
    }

    pub fn room_id(mut self, room_id: Option<u64>) -> Self {
        self.room_id = Some(room_id);
        self
    }

    pub fn status_id(mut self, status_id: Option<u64>) -> Self {
        self.status_id = Some(status_id);
        self
    }

    pub fn date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = Some(date_range);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub(crate) fn merge_into(self, filter: &mut TaskFilter) {
        if let Some(priority) = self.priority {
            filter.priority = priority;
        }
        if let Some(pending_only) = self.pending_only {
            filter.pending_only = pending_only;
        }
        if let Some(room_id) = self.room_id {
            filter.room_id = room_id;
        }
        if let Some(status_id) = self.status_id {
            filter.status_id = status_id;
        }
        if let Some(date_range) = self.date_range {
            filter.date_range = date_range;
        }
    }
}

/// Canonical key of one cached page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterSignature {
    pub filter: TaskFilter,
    pub page: u32,
    pub per_page: u32,
}

impl FilterSignature {
    pub fn new(filter: TaskFilter, page: u32, per_page: u32) -> Self {
        Self {
            filter,
            page,
            per_page,
        }
    }

    /// Query parameters for `GET /tasks`, in a fixed order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("per_page", self.per_page.to_string())];
        if let Some(priority) = self.filter.priority {
            pairs.push(("priority", priority.as_str().to_string()));
        }
        if self.filter.pending_only {
            pairs.push(("pending", "1".to_string()));
        }
        if let Some(room_id) = self.filter.room_id {
            pairs.push(("room_id", room_id.to_string()));
        }
        if let Some(status_id) = self.filter.status_id {
            pairs.push(("estado_id", status_id.to_string()));
        }
        if let Some(from) = self.filter.date_range.from {
            pairs.push(("desde", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.filter.date_range.to {
            pairs.push(("hasta", to.format("%Y-%m-%d").to_string()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs
    }
}

impl fmt::Display for FilterSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self
            .query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        f.write_str(&key)
    }
}
