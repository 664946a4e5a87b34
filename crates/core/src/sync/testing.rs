//! Test helpers: record builders and a scripted gateway

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::signature::FilterSignature;
use crate::gateway::TaskGateway;
use crate::task::{
    CachePage, CleaningTask, FinalizeRequest, PageMeta, RoomRef, TaskId, TaskUpdate, UserRef,
};
use crate::{Error, Result};

pub fn task(id: TaskId) -> CleaningTask {
    let room = RoomRef {
        id: id * 10,
        number: format!("{}", 100 + id),
        floor: Some(1),
        type_name: Some("Doble".to_string()),
    };
    CleaningTask::new(id, room, Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap())
}

pub fn assigned(id: TaskId) -> CleaningTask {
    task(id).with_assignee(UserRef {
        id: 4,
        name: "Ana".to_string(),
    })
}

pub fn meta(current_page: u32, last_page: u32) -> PageMeta {
    PageMeta {
        current_page,
        last_page,
        per_page: 15,
        total: u64::from(last_page) * 15,
        from: Some(u64::from(current_page - 1) * 15 + 1),
        to: Some(u64::from(current_page) * 15),
    }
}

pub fn page_of(records: Vec<CleaningTask>) -> CachePage {
    CachePage::new(records, meta(1, 1))
}

enum Reply<T> {
    Ready(Result<T>),
    Held(oneshot::Receiver<Result<T>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T> {
        match self {
            Self::Ready(result) => result,
            Self::Held(rx) => rx
                .await
                .unwrap_or_else(|_| Err(Error::transport("reply dropped"))),
        }
    }
}

/// Gateway whose replies are queued by the test. Replies can be held open
/// with a oneshot to observe state while a call is pending.
///
/// With nothing queued, `list` answers with an empty page and mutations echo
/// a fresh task.
#[derive(Default)]
pub struct ScriptedGateway {
    lists: Mutex<VecDeque<Reply<CachePage>>>,
    confirms: Mutex<VecDeque<Reply<CleaningTask>>>,
    gets: Mutex<VecDeque<Reply<CleaningTask>>>,
    deletes: Mutex<VecDeque<Reply<()>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list(&self, result: Result<CachePage>) {
        self.lists.lock().push_back(Reply::Ready(result));
    }

    pub fn hold_list(&self) -> oneshot::Sender<Result<CachePage>> {
        let (tx, rx) = oneshot::channel();
        self.lists.lock().push_back(Reply::Held(rx));
        tx
    }

    pub fn push_confirm(&self, result: Result<CleaningTask>) {
        self.confirms.lock().push_back(Reply::Ready(result));
    }

    pub fn hold_confirm(&self) -> oneshot::Sender<Result<CleaningTask>> {
        let (tx, rx) = oneshot::channel();
        self.confirms.lock().push_back(Reply::Held(rx));
        tx
    }

    pub fn push_get(&self, result: Result<CleaningTask>) {
        self.gets.lock().push_back(Reply::Ready(result));
    }

    pub fn push_delete(&self, result: Result<()>) {
        self.deletes.lock().push_back(Reply::Ready(result));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl TaskGateway for ScriptedGateway {
    async fn list(&self, signature: &FilterSignature) -> Result<CachePage> {
        self.record(format!("list {signature}"));
        let reply = self.lists.lock().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(page_of(Vec::new())),
        }
    }

    async fn get(&self, id: TaskId) -> Result<CleaningTask> {
        self.record(format!("get {id}"));
        let reply = self.gets.lock().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(task(id)),
        }
    }

    async fn update(&self, id: TaskId, update: &TaskUpdate) -> Result<CleaningTask> {
        let body = serde_json::to_string(update)?;
        self.record(format!("update {id} {body}"));
        let reply = self.confirms.lock().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(task(id)),
        }
    }

    async fn finalize(&self, id: TaskId, request: &FinalizeRequest) -> Result<CleaningTask> {
        self.record(format!("finalize {id} {}", request.finished_at.to_rfc3339()));
        let reply = self.confirms.lock().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(task(id).with_finished_at(request.finished_at)),
        }
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        self.record(format!("delete {id}"));
        let reply = self.deletes.lock().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(()),
        }
    }
}
