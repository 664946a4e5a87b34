//! Remote collection gateway
//!
//! Defines the interface to the remote task service and its HTTP
//! implementation.

mod http;

use async_trait::async_trait;

use crate::sync::FilterSignature;
use crate::task::{CachePage, CleaningTask, FinalizeRequest, RemoteCall, TaskId, TaskUpdate};
use crate::Result;

pub use http::HttpTaskGateway;

/// Remote operations on cleaning tasks
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// Fetch one page of tasks
    async fn list(&self, signature: &FilterSignature) -> Result<CachePage>;

    /// Fetch a single task
    async fn get(&self, id: TaskId) -> Result<CleaningTask>;

    /// Apply a partial update
    async fn update(&self, id: TaskId, update: &TaskUpdate) -> Result<CleaningTask>;

    /// Mark a task clean
    async fn finalize(&self, id: TaskId, request: &FinalizeRequest) -> Result<CleaningTask>;

    /// Delete a task
    async fn delete(&self, id: TaskId) -> Result<()>;

    /// Issue the remote call that confirms a mutation intent
    async fn confirm(&self, id: TaskId, call: &RemoteCall) -> Result<CleaningTask> {
        match call {
            RemoteCall::Update(update) => self.update(id, update).await,
            RemoteCall::Finalize(request) => self.finalize(id, request).await,
        }
    }
}
