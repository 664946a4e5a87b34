//! Mutation executor
//!
//! Runs one optimistic mutation: guard the id, snapshot and patch the cached
//! record, call the remote service, then confirm or roll back.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::cache::{RestoreOutcome, Snapshot};
use super::signature::FilterSignature;
use super::state::SharedState;
use crate::gateway::TaskGateway;
use crate::task::{CleaningTask, MutationIntent, TaskId};
use crate::{Error, Result};

/// How a pending mutation ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settle {
    /// Remote confirmed. Keep the optimistic state and mark the page stale.
    Confirmed,
    /// Remote failed or the caller went away. Put the snapshot back.
    RolledBack,
    /// Nothing was patched. Only release the busy mark.
    Released,
}

/// Busy mark plus rollback target for one in-flight mutation.
///
/// Dropping it without settling rolls back, which covers callers that drop
/// the mutation future before the remote call resolves.
struct PendingMutation {
    state: SharedState,
    id: TaskId,
    signature: Option<FilterSignature>,
    snapshot: Option<Snapshot>,
    settled: bool,
}

impl PendingMutation {
    fn settle(mut self, how: Settle) {
        self.finish(how);
    }

    fn finish(&mut self, how: Settle) {
        self.settled = true;
        let mut state = self.state.lock();
        state.busy.release(self.id);
        if state.closed {
            return;
        }
        match how {
            Settle::Confirmed => {
                if let Some(sig) = &self.signature {
                    state.cache.invalidate(sig);
                }
            }
            Settle::RolledBack => {
                if let Some(snapshot) = &self.snapshot {
                    match state.cache.restore_record(snapshot, self.id) {
                        RestoreOutcome::Restored => {}
                        outcome => debug!(id = self.id, ?outcome, "Rollback skipped"),
                    }
                }
            }
            Settle::Released => {}
        }
    }
}

impl Drop for PendingMutation {
    fn drop(&mut self) {
        if !self.settled {
            warn!(id = self.id, "Mutation dropped before settling, rolling back");
            self.finish(Settle::RolledBack);
        }
    }
}

pub struct MutationExecutor {
    gateway: Arc<dyn TaskGateway>,
    state: SharedState,
    timeout: Duration,
}

impl MutationExecutor {
    pub(crate) fn new(gateway: Arc<dyn TaskGateway>, state: SharedState, timeout: Duration) -> Self {
        Self {
            gateway,
            state,
            timeout,
        }
    }

    /// Apply a typed intent optimistically and confirm it remotely.
    ///
    /// Returns the record as reported by the remote service. The cache keeps
    /// the optimistic version until the next fetch.
    pub async fn execute(&self, id: TaskId, intent: MutationIntent) -> Result<CleaningTask> {
        intent.validate()?;
        let call = intent.remote_call();
        let label = intent.name();
        self.execute_with(
            id,
            label,
            move |task| intent.apply(task),
            self.gateway.confirm(id, &call),
        )
        .await
    }

    /// General form of [`execute`](Self::execute): `patch` is applied to the
    /// cached record before `remote` is polled.
    pub async fn execute_with<P, F, T>(&self, id: TaskId, label: &str, patch: P, remote: F) -> Result<T>
    where
        P: FnOnce(&mut CleaningTask),
        F: Future<Output = Result<T>>,
    {
        let pending = self.begin(id, Some(patch))?;
        let optimistic = pending.snapshot.is_some();

        match with_timeout(self.timeout, remote).await {
            Ok(value) => {
                pending.settle(if optimistic {
                    Settle::Confirmed
                } else {
                    Settle::Released
                });
                info!(id, mutation = label, "Mutation confirmed");
                Ok(value)
            }
            Err(e) => {
                pending.settle(Settle::RolledBack);
                warn!(id, mutation = label, error = %e, "Mutation failed, rolled back");
                Err(e)
            }
        }
    }

    /// Run a remote call under the busy mark for `id` without patching the
    /// cache.
    pub async fn guarded<F, T>(&self, id: TaskId, remote: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let pending = self.begin(id, None::<fn(&mut CleaningTask)>)?;
        let result = with_timeout(self.timeout, remote).await;
        pending.settle(Settle::Released);
        result
    }

    fn begin<P>(&self, id: TaskId, patch: Option<P>) -> Result<PendingMutation>
    where
        P: FnOnce(&mut CleaningTask),
    {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }
        if !state.busy.try_acquire(id) {
            return Err(Error::Busy { task_id: id });
        }

        let signature = state.displayed_signature();
        let snapshot = match (&signature, patch) {
            (Some(sig), Some(patch)) => {
                let patched = state.cache.patch_record(sig, id, patch);
                if patched.is_none() {
                    debug!(id, "Record not in cache, mutating remotely only");
                }
                patched.map(|patched| patched.before)
            }
            _ => None,
        };

        Ok(PendingMutation {
            state: Arc::clone(&self.state),
            id,
            signature,
            snapshot,
            settled: false,
        })
    }
}

pub(crate) async fn with_timeout<F, T>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
