//! Shared session state
//!
//! Every component of a session lives in one struct behind one lock. The lock
//! is never held across an `.await`, so each patch, rollback or install is
//! atomic with respect to every other operation on the session.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::cache::{CacheStore, FetchSeq};
use super::guard::BusySet;
use super::query::QueryController;
use super::selection::SelectionSet;
use super::signature::FilterSignature;
use crate::task::CachePage;

pub(crate) type SharedState = Arc<Mutex<SyncState>>;

#[derive(Debug)]
pub(crate) struct SyncState {
    pub cache: CacheStore,
    pub busy: BusySet,
    pub selection: SelectionSet,
    pub query: QueryController,
    /// Fetches in flight per signature
    pub in_flight: HashMap<FilterSignature, usize>,
    pub next_seq: FetchSeq,
    /// Signature of the most recently installed page
    pub last_installed: Option<FilterSignature>,
    /// Signature the current selection was made on
    pub selection_signature: Option<FilterSignature>,
    pub closed: bool,
}

impl SyncState {
    pub fn new(per_page: u32) -> Self {
        Self {
            cache: CacheStore::new(),
            busy: BusySet::new(),
            selection: SelectionSet::new(),
            query: QueryController::new(per_page),
            in_flight: HashMap::new(),
            next_seq: 0,
            last_installed: None,
            selection_signature: None,
            closed: false,
        }
    }

    pub fn next_seq(&mut self) -> FetchSeq {
        self.next_seq += 1;
        self.next_seq
    }

    /// The page the user is looking at: the active signature's page if it
    /// has been fetched, otherwise the last installed page.
    pub fn displayed_signature(&self) -> Option<FilterSignature> {
        let active = self.query.signature();
        if self.cache.read(&active).is_some() {
            return Some(active);
        }
        self.last_installed
            .clone()
            .filter(|sig| self.cache.read(sig).is_some())
    }

    pub fn displayed_page(&self) -> Option<&CachePage> {
        let sig = self.displayed_signature()?;
        self.cache.read(&sig)
    }

    pub fn is_fetching(&self, signature: &FilterSignature) -> bool {
        self.in_flight.get(signature).is_some_and(|n| *n > 0)
    }

    /// Follow the selection to whatever page is on screen after a query
    /// change. A cached page can become visible before its refetch lands.
    pub fn sync_displayed_selection(&mut self) {
        if let Some(signature) = self.displayed_signature() {
            self.sync_selection(&signature);
        }
    }

    /// Keep the selection consistent with a freshly installed page
    pub fn sync_selection(&mut self, signature: &FilterSignature) {
        if self.selection_signature.as_ref() != Some(signature) {
            self.selection.clear();
            self.selection_signature = Some(signature.clone());
        } else if let Some(page) = self.cache.read(signature) {
            let ids = page.ids();
            self.selection.retain_within(&ids);
        }
    }
}

/// Decrements the in-flight counter of a signature when dropped, so a
/// cancelled fetch does not leave the view revalidating forever.
pub(crate) struct FetchTicket {
    state: SharedState,
    signature: FilterSignature,
}

impl FetchTicket {
    pub fn issue(state: &SharedState, guard: &mut SyncState, signature: FilterSignature) -> Self {
        *guard.in_flight.entry(signature.clone()).or_default() += 1;
        Self {
            state: Arc::clone(state),
            signature,
        }
    }
}

impl Drop for FetchTicket {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if let Some(n) = state.in_flight.get_mut(&self.signature) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                state.in_flight.remove(&self.signature);
            }
        }
    }
}
