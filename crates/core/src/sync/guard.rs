//! Concurrency guard
//!
//! The set of task ids that currently have a mutation in flight.

use std::collections::HashSet;

use tracing::debug;

use crate::task::TaskId;

#[derive(Debug, Default)]
pub struct BusySet {
    ids: HashSet<TaskId>,
}

impl BusySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` busy. Returns `false` if it already was.
    pub fn try_acquire(&mut self, id: TaskId) -> bool {
        let acquired = self.ids.insert(id);
        debug!(id, acquired, "Busy acquire");
        acquired
    }

    pub fn release(&mut self, id: TaskId) {
        self.ids.remove(&id);
        debug!(id, "Busy release");
    }

    pub fn is_busy(&self, id: TaskId) -> bool {
        self.ids.contains(&id)
    }

    /// Busy ids in ascending order
    pub fn ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
