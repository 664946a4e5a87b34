//! Task list session
//!
//! The public face of the synchronization core: one session per mounted task
//! list. It owns the cache, busy set, selection and query state, and exposes
//! the actions a UI layer calls.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::cache::ReplaceOutcome;
use super::executor::{with_timeout, MutationExecutor};
use super::query::{Freshness, SortKey, SortSpec};
use super::signature::{FilterPatch, FilterSignature, TaskFilter};
use super::state::{FetchTicket, SharedState, SyncState};
use crate::config::SyncConfig;
use crate::gateway::TaskGateway;
use crate::task::{CleaningTask, FinalizeRequest, MutationIntent, PageMeta, TaskId};
use crate::{Error, Result};

/// Snapshot of everything a task list renders
#[derive(Debug, Clone)]
pub struct TaskListView {
    /// Records in display order
    pub records: Vec<CleaningTask>,
    pub meta: Option<PageMeta>,
    pub freshness: Freshness,
    /// The shown page may be outdated by a confirmed mutation
    pub stale: bool,
    /// The records belong to a previous signature while the active one loads
    pub placeholder: bool,
    pub filter: TaskFilter,
    pub page: u32,
    pub sort: Option<SortSpec>,
    pub busy: Vec<TaskId>,
    pub selected: Vec<TaskId>,
}

pub struct TaskListSession {
    gateway: Arc<dyn TaskGateway>,
    state: SharedState,
    executor: MutationExecutor,
    fetch_timeout: Duration,
}

impl TaskListSession {
    pub fn new(gateway: Arc<dyn TaskGateway>, config: SyncConfig) -> Self {
        let state = Arc::new(Mutex::new(SyncState::new(config.per_page)));
        let executor = MutationExecutor::new(
            Arc::clone(&gateway),
            Arc::clone(&state),
            config.mutation_timeout,
        );
        Self {
            gateway,
            state,
            executor,
            fetch_timeout: config.fetch_timeout,
        }
    }

    /// Fetch the active signature
    pub async fn refresh(&self) -> Result<ReplaceOutcome> {
        let signature = self.state.lock().query.signature();
        self.fetch(signature).await
    }

    async fn fetch(&self, signature: FilterSignature) -> Result<ReplaceOutcome> {
        let (seq, ticket) = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(Error::Closed);
            }
            let seq = state.next_seq();
            let ticket = FetchTicket::issue(&self.state, &mut state, signature.clone());
            (seq, ticket)
        };
        debug!(%signature, seq, "Fetching page");

        let result = with_timeout(self.fetch_timeout, self.gateway.list(&signature)).await;
        drop(ticket);

        let mut state = self.state.lock();
        if state.closed {
            debug!(%signature, seq, "Session closed, dropping fetch result");
            return Err(Error::Closed);
        }
        let page = result?;
        let meta = page.meta.clone();
        let outcome = state.cache.replace(&signature, page, seq);
        match outcome {
            ReplaceOutcome::Installed => {
                info!(%signature, seq, total = meta.total, "Page installed");
                state.last_installed = Some(signature.clone());
                if state.query.signature() == signature {
                    state.sync_selection(&signature);
                }
            }
            ReplaceOutcome::Discarded { installed } => {
                warn!(%signature, seq, installed, "Discarding late fetch result");
            }
        }
        Ok(outcome)
    }

    /// Merge `patch` into the filters, go back to page 1 and fetch
    pub async fn set_filter(&self, patch: FilterPatch) -> Result<ReplaceOutcome> {
        let signature = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(Error::Closed);
            }
            if let Some(previous) = state.displayed_signature() {
                state.cache.invalidate(&previous);
            }
            let signature = state.query.set_filter(patch);
            state.sync_displayed_selection();
            signature
        };
        self.fetch(signature).await
    }

    /// Navigate to page `n`. Out-of-range pages are ignored and return
    /// `Ok(None)`.
    pub async fn goto_page(&self, n: u32) -> Result<Option<ReplaceOutcome>> {
        let signature = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(Error::Closed);
            }
            let last_meta = state.displayed_page().map(|p| p.meta.clone());
            if !state.query.goto_page(n, last_meta.as_ref()) {
                debug!(page = n, "Ignoring out-of-range page");
                return Ok(None);
            }
            state.sync_displayed_selection();
            state.query.signature()
        };
        self.fetch(signature).await.map(Some)
    }

    pub fn set_sort(&self, key: SortKey) -> SortSpec {
        self.state.lock().query.set_sort(key)
    }

    /// Toggle one record's selection. Ids outside the visible page are
    /// ignored.
    pub fn toggle_one(&self, id: TaskId) -> bool {
        let mut state = self.state.lock();
        let on_page = state.displayed_page().is_some_and(|p| p.get(id).is_some());
        if !on_page {
            return false;
        }
        state.selection.toggle_one(id)
    }

    pub fn toggle_all_on_page(&self) {
        let mut state = self.state.lock();
        let ids = state.displayed_page().map(|p| p.ids()).unwrap_or_default();
        state.selection.toggle_all_on_page(&ids);
    }

    pub fn clear_selection(&self) {
        self.state.lock().selection.clear();
    }

    /// Mark a task clean, releasing its assignee
    pub async fn finalize(&self, id: TaskId, request: FinalizeRequest) -> Result<CleaningTask> {
        self.update(id, MutationIntent::Finalize(request)).await
    }

    /// Mark a task dirty again
    pub async fn reopen(&self, id: TaskId) -> Result<CleaningTask> {
        self.update(id, MutationIntent::Reopen).await
    }

    pub async fn update(&self, id: TaskId, intent: MutationIntent) -> Result<CleaningTask> {
        self.executor.execute(id, intent).await
    }

    /// Reload one record from the remote service into the visible page.
    /// Returns whether the record was on the page.
    pub async fn refresh_record(&self, id: TaskId) -> Result<bool> {
        let task = self.executor.guarded(id, self.gateway.get(id)).await?;
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }
        let Some(signature) = state.displayed_signature() else {
            return Ok(false);
        };
        Ok(state.cache.put_record(&signature, task))
    }

    /// Delete a task remotely, then refetch. Not optimistic: removing a row
    /// would change the page totals.
    ///
    /// Once the server confirms, the call succeeds even if the refetch does
    /// not. The row is dropped from the cached pages, which stay stale, and
    /// `Ok(None)` is returned.
    pub async fn delete(&self, id: TaskId) -> Result<Option<ReplaceOutcome>> {
        self.executor.guarded(id, self.gateway.delete(id)).await?;
        {
            let mut state = self.state.lock();
            state.cache.remove_record(id);
            state.cache.invalidate_all();
            state.selection.clear();
        }
        info!(id, "Task deleted");
        match self.refresh().await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                warn!(id, error = %e, "Refetch after delete failed");
                Ok(None)
            }
        }
    }

    pub fn view(&self) -> TaskListView {
        let state = self.state.lock();
        let active = state.query.signature();
        let displayed = state.displayed_signature();
        let page = displayed.as_ref().and_then(|sig| state.cache.read(sig));

        TaskListView {
            records: page
                .map(|p| state.query.sorted(&p.records))
                .unwrap_or_default(),
            meta: page.map(|p| p.meta.clone()),
            freshness: Freshness::derive(
                state.cache.read(&active).is_some(),
                state.is_fetching(&active),
            ),
            stale: displayed
                .as_ref()
                .is_some_and(|sig| state.cache.is_stale(sig)),
            placeholder: displayed.as_ref().is_some_and(|sig| *sig != active),
            filter: state.query.filter().clone(),
            page: state.query.page(),
            sort: state.query.sort(),
            busy: state.busy.ids(),
            selected: state.selection.ids(),
        }
    }

    /// Tear the session down. Pending fetches and mutations resolve without
    /// writing anything, and new actions fail with [`Error::Closed`].
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.cache.clear();
        state.selection.clear();
        info!("Task list session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::{assigned, meta, page_of, task, ScriptedGateway};
    use crate::task::{CachePage, Priority};
    use crate::ErrorKind;
    use chrono::{TimeZone, Utc};
    use futures::poll;
    use std::pin::pin;

    fn at(day: u32, hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    async fn session_with(records: Vec<CleaningTask>) -> (TaskListSession, Arc<ScriptedGateway>) {
        session_with_config(records, SyncConfig::default()).await
    }

    async fn session_with_config(
        records: Vec<CleaningTask>,
        config: SyncConfig,
    ) -> (TaskListSession, Arc<ScriptedGateway>) {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_list(Ok(page_of(records)));
        let session = TaskListSession::new(gateway.clone(), config);
        session.refresh().await.unwrap();
        (session, gateway)
    }

    fn current_page(session: &TaskListSession) -> CachePage {
        let view = session.view();
        CachePage::new(view.records, view.meta.unwrap())
    }

    #[tokio::test]
    async fn test_finalize_is_visible_before_confirmation() {
        let (session, gateway) = session_with(vec![assigned(7), task(9)]).await;
        let reply = gateway.hold_confirm();

        let mut call = pin!(session.finalize(7, FinalizeRequest::new(at(2, 9))));
        assert!(poll!(call.as_mut()).is_pending());

        let view = session.view();
        let record = view.records.iter().find(|t| t.id == 7).unwrap();
        assert_eq!(record.finished_at, Some(at(2, 9)));
        assert!(record.assignee.is_none());
        assert!(record.is_clean());
        assert_eq!(view.busy, vec![7]);

        reply.send(Ok(task(7).with_finished_at(at(2, 9)))).unwrap();
        let confirmed = call.await.unwrap();
        assert_eq!(confirmed.finished_at, Some(at(2, 9)));

        let view = session.view();
        assert!(view.busy.is_empty());
        assert!(view.stale);
        assert!(view.records[0].is_clean());
        assert_eq!(
            gateway.calls().last().unwrap(),
            &format!("finalize 7 {}", at(2, 9).to_rfc3339())
        );
    }

    #[tokio::test]
    async fn test_failed_finalize_restores_exact_page() {
        let done = task(9).with_finished_at(at(1, 10));
        let (session, gateway) = session_with(vec![task(7), done]).await;
        let before = current_page(&session);

        gateway.push_confirm(Err(Error::remote(500, "boom")));
        let err = session
            .finalize(7, FinalizeRequest::new(at(2, 9)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(current_page(&session), before);
        assert!(session.view().busy.is_empty());
        assert!(!session.view().stale);
    }

    #[tokio::test]
    async fn test_second_mutation_on_busy_record_is_rejected() {
        let (session, gateway) = session_with(vec![assigned(7)]).await;
        let reply = gateway.hold_confirm();

        let mut first = pin!(session.finalize(7, FinalizeRequest::new(at(2, 9))));
        assert!(poll!(first.as_mut()).is_pending());
        let calls_before = gateway.calls().len();

        let err = session.reopen(7).await.unwrap_err();
        assert!(matches!(err, Error::Busy { task_id: 7 }));
        assert_eq!(err.kind(), ErrorKind::Busy);
        assert_eq!(gateway.calls().len(), calls_before);
        assert!(session.view().records[0].is_clean());

        reply.send(Ok(task(7))).unwrap();
        first.await.unwrap();

        session.reopen(7).await.unwrap();
        assert!(!session.view().records[0].is_clean());
    }

    #[tokio::test]
    async fn test_mutations_on_distinct_ids_commute() {
        let (session, gateway) = session_with(vec![task(7), task(9), task(11)]).await;
        let before = current_page(&session);
        let reply_a = gateway.hold_confirm();
        let reply_b = gateway.hold_confirm();

        let mut a = pin!(session.finalize(7, FinalizeRequest::new(at(2, 9))));
        let mut b = pin!(session.update(9, MutationIntent::SetPriority(Some(Priority::Urgent))));
        assert!(poll!(a.as_mut()).is_pending());
        assert!(poll!(b.as_mut()).is_pending());

        reply_a.send(Err(Error::remote(422, "invalid"))).unwrap();
        assert!(a.await.is_err());
        reply_b.send(Ok(task(9))).unwrap();
        b.await.unwrap();

        let mut expected = before.clone();
        expected.records[1].priority = Some(Priority::Urgent);
        assert_eq!(current_page(&session), expected);
    }

    #[tokio::test]
    async fn test_failed_finalize_restores_assignee_and_status() {
        let done = task(9).with_finished_at(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        let (session, gateway) = session_with(vec![assigned(7), done]).await;
        let before = current_page(&session);
        let reply = gateway.hold_confirm();

        let mut call = pin!(session.finalize(7, FinalizeRequest::new(at(2, 9))));
        assert!(poll!(call.as_mut()).is_pending());
        let optimistic = session.view().records[0].clone();
        assert_eq!(optimistic.finished_at, Some(at(2, 9)));
        assert!(optimistic.assignee.is_none());

        reply.send(Err(Error::transport("connection reset"))).unwrap();
        let err = call.await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(current_page(&session), before);
        assert!(session.view().records[0].finished_at.is_none());
    }

    #[tokio::test]
    async fn test_finalize_already_clean_record_changes_nothing() {
        let done = task(9).with_finished_at(at(2, 9));
        let (session, _gateway) = session_with(vec![done]).await;
        let before = current_page(&session);

        session
            .finalize(9, FinalizeRequest::new(at(2, 9)))
            .await
            .unwrap();
        assert_eq!(current_page(&session), before);
    }

    #[tokio::test]
    async fn test_invalid_notes_are_rejected_before_patch() {
        let (session, gateway) = session_with(vec![task(7)]).await;
        let calls_before = gateway.calls().len();

        let err = session
            .update(7, MutationIntent::SetNotes(Some("n".repeat(501))))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(session.view().records[0].notes.is_none());
        assert!(session.view().busy.is_empty());
        assert_eq!(gateway.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_timeout_rolls_back_and_releases() {
        let config = SyncConfig {
            mutation_timeout: Duration::from_millis(20),
            ..SyncConfig::default()
        };
        let (session, gateway) = session_with_config(vec![task(7)], config).await;
        let before = current_page(&session);
        let _reply = gateway.hold_confirm();

        let err = session
            .finalize(7, FinalizeRequest::new(at(2, 9)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { millis: 20 }));
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(current_page(&session), before);
        assert!(session.view().busy.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_mutation_rolls_back() {
        let (session, gateway) = session_with(vec![assigned(7)]).await;
        let before = current_page(&session);
        let _reply = gateway.hold_confirm();

        {
            let mut call = Box::pin(session.finalize(7, FinalizeRequest::new(at(2, 9))));
            assert!(poll!(call.as_mut()).is_pending());
            assert!(session.view().records[0].is_clean());
        }

        assert_eq!(current_page(&session), before);
        assert!(session.view().busy.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_wins_over_pending_rollback() {
        let (session, gateway) = session_with(vec![task(7)]).await;
        let reply = gateway.hold_confirm();

        let mut call = pin!(session.finalize(7, FinalizeRequest::new(at(2, 9))));
        assert!(poll!(call.as_mut()).is_pending());

        let fresh = page_of(vec![task(7).with_notes("from server")]);
        gateway.push_list(Ok(fresh.clone()));
        session.refresh().await.unwrap();

        reply.send(Err(Error::remote(500, "boom"))).unwrap();
        assert!(call.await.is_err());
        assert_eq!(current_page(&session), fresh);
    }

    #[tokio::test]
    async fn test_late_fetch_does_not_overwrite_newer_data() {
        let (session, gateway) = session_with(vec![task(1)]).await;
        let slow = gateway.hold_list();
        gateway.push_list(Ok(page_of(vec![task(3)])));

        let mut first = pin!(session.refresh());
        assert!(poll!(first.as_mut()).is_pending());
        assert_eq!(session.view().freshness, Freshness::Revalidating);

        assert_eq!(session.refresh().await.unwrap(), ReplaceOutcome::Installed);
        slow.send(Ok(page_of(vec![task(2)]))).unwrap();
        assert!(matches!(
            first.await.unwrap(),
            ReplaceOutcome::Discarded { .. }
        ));

        let view = session.view();
        assert_eq!(view.records[0].id, 3);
        assert_eq!(view.freshness, Freshness::Settled);
    }

    #[tokio::test]
    async fn test_first_load_then_settled() {
        let gateway = Arc::new(ScriptedGateway::new());
        let reply = gateway.hold_list();
        let session = TaskListSession::new(gateway.clone(), SyncConfig::default());
        assert_eq!(session.view().freshness, Freshness::FirstLoad);

        let mut fetch = pin!(session.refresh());
        assert!(poll!(fetch.as_mut()).is_pending());
        assert_eq!(session.view().freshness, Freshness::FirstLoad);

        reply.send(Ok(page_of(vec![task(1)]))).unwrap();
        fetch.await.unwrap();
        assert_eq!(session.view().freshness, Freshness::Settled);
    }

    #[tokio::test]
    async fn test_set_filter_resets_page_and_shows_placeholder() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_list(Ok(CachePage::new(vec![task(1)], meta(1, 3))));
        gateway.push_list(Ok(CachePage::new(vec![task(2)], meta(2, 3))));
        let session = TaskListSession::new(gateway.clone(), SyncConfig::default());
        session.refresh().await.unwrap();
        session.goto_page(2).await.unwrap().unwrap();
        assert_eq!(session.view().page, 2);

        let reply = gateway.hold_list();
        let mut fetch = pin!(session.set_filter(FilterPatch::default().pending_only(true)));
        assert!(poll!(fetch.as_mut()).is_pending());

        let view = session.view();
        assert_eq!(view.page, 1);
        assert!(view.placeholder);
        assert_eq!(view.freshness, Freshness::FirstLoad);
        assert_eq!(view.records[0].id, 2);

        reply.send(Ok(page_of(vec![task(5)]))).unwrap();
        fetch.await.unwrap();
        let view = session.view();
        assert!(!view.placeholder);
        assert_eq!(view.records[0].id, 5);
        assert!(gateway
            .calls()
            .last()
            .unwrap()
            .contains("pending=1&page=1"));
    }

    #[tokio::test]
    async fn test_goto_page_out_of_range_is_ignored() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_list(Ok(CachePage::new(vec![task(1)], meta(1, 2))));
        let session = TaskListSession::new(gateway.clone(), SyncConfig::default());
        session.refresh().await.unwrap();
        let calls_before = gateway.calls().len();

        assert!(session.goto_page(0).await.unwrap().is_none());
        assert!(session.goto_page(3).await.unwrap().is_none());
        assert_eq!(session.view().page, 1);
        assert_eq!(gateway.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_toggle_all_on_page() {
        let (session, _gateway) = session_with(vec![task(7), task(9), task(11)]).await;

        session.toggle_all_on_page();
        assert_eq!(session.view().selected, vec![7, 9, 11]);

        session.toggle_all_on_page();
        assert!(session.view().selected.is_empty());
    }

    #[tokio::test]
    async fn test_selection_survives_sort_and_patch_but_not_navigation() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_list(Ok(CachePage::new(vec![task(7), task(9)], meta(1, 2))));
        let session = TaskListSession::new(gateway.clone(), SyncConfig::default());
        session.refresh().await.unwrap();

        assert!(session.toggle_one(7));
        assert!(!session.toggle_one(42));
        session.set_sort(SortKey::Id);
        session.set_sort(SortKey::Id);
        session.reopen(7).await.unwrap();
        assert_eq!(session.view().selected, vec![7]);
        assert_eq!(session.view().records[0].id, 9);

        gateway.push_list(Ok(CachePage::new(vec![task(7), task(9)], meta(1, 2))));
        session.refresh().await.unwrap();
        assert_eq!(session.view().selected, vec![7]);

        gateway.push_list(Ok(CachePage::new(vec![task(13)], meta(2, 2))));
        session.goto_page(2).await.unwrap();
        assert!(session.view().selected.is_empty());
    }

    #[tokio::test]
    async fn test_returning_to_cached_page_drops_other_selection() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_list(Ok(CachePage::new(vec![task(7), task(9)], meta(1, 2))));
        gateway.push_list(Ok(CachePage::new(vec![task(13)], meta(2, 2))));
        let session = TaskListSession::new(gateway.clone(), SyncConfig::default());
        session.refresh().await.unwrap();
        session.goto_page(2).await.unwrap().unwrap();
        assert!(session.toggle_one(13));

        let reply = gateway.hold_list();
        let mut back = pin!(session.goto_page(1));
        assert!(poll!(back.as_mut()).is_pending());

        let view = session.view();
        assert_eq!(view.records.iter().map(|t| t.id).collect::<Vec<_>>(), vec![7, 9]);
        assert!(view.selected.is_empty());

        reply.send(Err(Error::remote(500, "boom"))).unwrap();
        assert!(back.await.is_err());
        assert!(session.view().selected.is_empty());
        assert!(!session.toggle_one(13));
    }

    #[tokio::test]
    async fn test_query_changes_on_closed_session_are_refused() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_list(Ok(CachePage::new(vec![task(7)], meta(1, 3))));
        let session = TaskListSession::new(gateway.clone(), SyncConfig::default());
        session.refresh().await.unwrap();
        session.close();
        let calls_before = gateway.calls().len();

        let err = session
            .set_filter(FilterPatch::default().pending_only(true))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        assert!(matches!(session.goto_page(2).await, Err(Error::Closed)));

        let view = session.view();
        assert!(!view.filter.pending_only);
        assert_eq!(view.page, 1);
        assert_eq!(gateway.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_refetch_prunes_vanished_ids() {
        let (session, gateway) = session_with(vec![task(7), task(9)]).await;
        session.toggle_all_on_page();

        gateway.push_list(Ok(page_of(vec![task(9)])));
        session.refresh().await.unwrap();
        assert_eq!(session.view().selected, vec![9]);
    }

    #[tokio::test]
    async fn test_close_makes_resolutions_no_ops() {
        let (session, gateway) = session_with(vec![task(7)]).await;
        let reply = gateway.hold_confirm();

        let mut call = pin!(session.finalize(7, FinalizeRequest::new(at(2, 9))));
        assert!(poll!(call.as_mut()).is_pending());
        session.close();

        reply.send(Err(Error::remote(500, "boom"))).unwrap();
        assert!(call.await.is_err());
        assert!(session.view().records.is_empty());

        let err = session.reopen(7).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        assert!(matches!(session.refresh().await, Err(Error::Closed)));
    }

    #[tokio::test]
    async fn test_fetch_resolving_after_close_is_dropped() {
        let (session, gateway) = session_with(vec![task(7)]).await;
        let reply = gateway.hold_list();

        let mut fetch = pin!(session.refresh());
        assert!(poll!(fetch.as_mut()).is_pending());
        session.close();
        reply.send(Ok(page_of(vec![task(8)]))).unwrap();

        assert!(matches!(fetch.await, Err(Error::Closed)));
        assert!(session.view().records.is_empty());
    }

    #[tokio::test]
    async fn test_mutation_on_uncached_record_still_calls_remote() {
        let (session, gateway) = session_with(vec![task(7)]).await;
        let before = current_page(&session);

        session.reopen(99).await.unwrap();
        assert_eq!(current_page(&session), before);
        assert!(gateway.calls().last().unwrap().starts_with("update 99"));
    }

    #[tokio::test]
    async fn test_refresh_record_overwrites_in_place() {
        let (session, gateway) = session_with(vec![task(7), task(9)]).await;
        gateway.push_get(Ok(task(9).with_notes("checked")));

        assert!(session.refresh_record(9).await.unwrap());
        let view = session.view();
        assert_eq!(view.records[1].notes.as_deref(), Some("checked"));
        assert_eq!(view.records.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_refetches() {
        let (session, gateway) = session_with(vec![task(7), task(9)]).await;
        gateway.push_list(Ok(page_of(vec![task(9)])));

        session.delete(7).await.unwrap();
        let calls = gateway.calls();
        assert_eq!(calls[calls.len() - 2], "delete 7");
        assert_eq!(session.view().records.len(), 1);
        assert!(!session.view().stale);
    }

    #[tokio::test]
    async fn test_delete_succeeds_when_refetch_fails() {
        let (session, gateway) = session_with(vec![task(7), task(9)]).await;
        session.toggle_one(9);
        gateway.push_list(Err(Error::remote(503, "unavailable")));

        let outcome = session.delete(7).await.unwrap();
        assert!(outcome.is_none());

        let calls = gateway.calls();
        assert_eq!(calls[calls.len() - 2], "delete 7");
        let view = session.view();
        assert_eq!(view.records.iter().map(|t| t.id).collect::<Vec<_>>(), vec![9]);
        assert!(view.stale);
        assert!(view.busy.is_empty());
        assert!(view.selected.is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_page() {
        let (session, gateway) = session_with(vec![task(7)]).await;
        let before = current_page(&session);
        gateway.push_delete(Err(Error::remote(403, "forbidden")));

        let err = session.delete(7).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(current_page(&session), before);
        assert!(session.view().busy.is_empty());
    }
}
