//! Selection manager

use std::collections::BTreeSet;

use crate::task::TaskId;

/// Ids the user has selected on the visible page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<TaskId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one id. Returns whether it is selected afterwards.
    pub fn toggle_one(&mut self, id: TaskId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Select every id on the page unless all of them already are, in which
    /// case deselect them all.
    pub fn toggle_all_on_page(&mut self, page_ids: &[TaskId]) {
        let all_selected = !page_ids.is_empty() && page_ids.iter().all(|id| self.ids.contains(id));
        if all_selected {
            for id in page_ids {
                self.ids.remove(id);
            }
        } else {
            self.ids.extend(page_ids.iter().copied());
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that are not in `universe`
    pub fn retain_within(&mut self, universe: &[TaskId]) {
        self.ids.retain(|id| universe.contains(id));
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.ids.iter().copied().collect()
    }
}
