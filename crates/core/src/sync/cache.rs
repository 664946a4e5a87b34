//! Cache store
//!
//! Holds one page per filter signature. Pages are only changed through
//! [`CacheStore::replace`] and [`CacheStore::patch_record`] (and the matching
//! rollback, [`CacheStore::restore_record`]).

use std::collections::HashMap;

use tracing::debug;

use super::signature::FilterSignature;
use crate::task::{CachePage, CleaningTask, TaskId};

/// Monotonic number identifying one fetch request
pub type FetchSeq = u64;

#[derive(Debug, Clone)]
struct CacheEntry {
    page: CachePage,
    seq: FetchSeq,
    stale: bool,
}

/// Result of installing a fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Installed,
    /// A response from a newer request is already installed
    Discarded { installed: FetchSeq },
}

/// Copy of a page taken right before an optimistic patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub signature: FilterSignature,
    /// Fetch that produced the page the snapshot was taken from
    pub seq: FetchSeq,
    pub page: CachePage,
}

/// Pages around a successful [`CacheStore::patch_record`]
#[derive(Debug, Clone)]
pub struct Patched {
    pub before: Snapshot,
    pub after: CachePage,
}

/// Result of rolling back one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    /// The page was replaced by a newer fetch since the snapshot
    Superseded,
    /// The page or the record is no longer cached
    Missing,
}

#[derive(Debug, Default)]
pub struct CacheStore {
    entries: HashMap<FilterSignature, CacheEntry>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fetched page, unless a newer fetch already landed for the
    /// same signature.
    pub fn replace(
        &mut self,
        signature: &FilterSignature,
        page: CachePage,
        seq: FetchSeq,
    ) -> ReplaceOutcome {
        if let Some(entry) = self.entries.get(signature) {
            if entry.seq > seq {
                return ReplaceOutcome::Discarded { installed: entry.seq };
            }
        }
        debug!(%signature, seq, records = page.records.len(), "Installing page");
        self.entries.insert(
            signature.clone(),
            CacheEntry {
                page,
                seq,
                stale: false,
            },
        );
        ReplaceOutcome::Installed
    }

    pub fn read(&self, signature: &FilterSignature) -> Option<&CachePage> {
        self.entries.get(signature).map(|e| &e.page)
    }

    /// Sequence number of the installed page
    pub fn seq(&self, signature: &FilterSignature) -> Option<FetchSeq> {
        self.entries.get(signature).map(|e| e.seq)
    }

    pub fn is_stale(&self, signature: &FilterSignature) -> bool {
        self.entries.get(signature).is_some_and(|e| e.stale)
    }

    /// Mark a page as possibly outdated without dropping it
    pub fn invalidate(&mut self, signature: &FilterSignature) {
        if let Some(entry) = self.entries.get_mut(signature) {
            entry.stale = true;
        }
    }

    pub fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.stale = true;
        }
    }

    /// Rewrite one record in place. Pagination metadata and record order are
    /// never touched. Returns `None` when the page or record is not cached.
    pub fn patch_record<F>(
        &mut self,
        signature: &FilterSignature,
        id: TaskId,
        patch: F,
    ) -> Option<Patched>
    where
        F: FnOnce(&mut CleaningTask),
    {
        let entry = self.entries.get_mut(signature)?;
        entry.page.get(id)?;

        let before = Snapshot {
            signature: signature.clone(),
            seq: entry.seq,
            page: entry.page.clone(),
        };
        if let Some(record) = entry.page.get_mut(id) {
            patch(record);
        }
        debug!(%signature, id, "Patched record");

        Some(Patched {
            before,
            after: entry.page.clone(),
        })
    }

    /// Put the snapshot's copy of record `id` back into the page.
    ///
    /// A no-op when a newer fetch has replaced the page since the snapshot.
    /// Other records are left alone so that concurrent mutations on different
    /// ids do not undo each other.
    pub fn restore_record(&mut self, snapshot: &Snapshot, id: TaskId) -> RestoreOutcome {
        let Some(entry) = self.entries.get_mut(&snapshot.signature) else {
            return RestoreOutcome::Missing;
        };
        if entry.seq != snapshot.seq {
            return RestoreOutcome::Superseded;
        }
        let (Some(original), Some(current)) = (snapshot.page.get(id), entry.page.get_mut(id))
        else {
            return RestoreOutcome::Missing;
        };
        *current = original.clone();
        debug!(signature = %snapshot.signature, id, "Restored record");
        RestoreOutcome::Restored
    }

    /// Overwrite one record with fresh server data, keeping its position
    pub fn put_record(&mut self, signature: &FilterSignature, task: CleaningTask) -> bool {
        let Some(entry) = self.entries.get_mut(signature) else {
            return false;
        };
        match entry.page.get_mut(task.id) {
            Some(current) => {
                *current = task;
                true
            }
            None => false,
        }
    }

    /// Drop a record the server no longer has from every cached page.
    /// Pagination metadata is left as fetched.
    pub fn remove_record(&mut self, id: TaskId) -> bool {
        let mut removed = false;
        for entry in self.entries.values_mut() {
            let before = entry.page.records.len();
            entry.page.records.retain(|t| t.id != id);
            removed |= entry.page.records.len() != before;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
