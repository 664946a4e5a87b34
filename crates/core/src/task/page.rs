//! Paginated task list payloads

use serde::{Deserialize, Serialize};

use super::model::{CleaningTask, TaskId};

/// Pagination metadata as reported by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
    /// 1-based index of the first record, `None` on an empty page
    #[serde(default)]
    pub from: Option<u64>,
    #[serde(default)]
    pub to: Option<u64>,
}

impl PageMeta {
    /// Whether `page` is a valid page number for this listing
    pub fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.last_page.max(1)
    }
}

/// One page of tasks as held by the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachePage {
    pub records: Vec<CleaningTask>,
    pub meta: PageMeta,
}

impl CachePage {
    pub fn new(records: Vec<CleaningTask>, meta: PageMeta) -> Self {
        Self { records, meta }
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.records.iter().map(|t| t.id).collect()
    }

    pub fn get(&self, id: TaskId) -> Option<&CleaningTask> {
        self.records.iter().find(|t| t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut CleaningTask> {
        self.records.iter_mut().find(|t| t.id == id)
    }
}

/// Wire shape of `GET /tasks`
#[derive(Debug, Deserialize)]
pub struct TaskListResponse {
    pub data: Vec<CleaningTask>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl From<TaskListResponse> for CachePage {
    fn from(res: TaskListResponse) -> Self {
        Self::new(res.data, res.meta)
    }
}

/// Wire shape of single-task responses
#[derive(Debug, Deserialize)]
pub struct TaskResponse {
    pub data: CleaningTask,
}
