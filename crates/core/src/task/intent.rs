//! Typed mutation intents
//!
//! Each intent knows the local patch it applies to a cached task and the
//! remote request that confirms it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::{CleaningTask, Priority, UserRef};
use crate::{Error, Result};

/// Maximum length of the free-text notes, in characters
pub const MAX_NOTES_LEN: usize = 500;

/// Body of `PATCH /tasks/{id}/finalize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizeRequest {
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FinalizeRequest {
    pub fn new(finished_at: DateTime<Utc>) -> Self {
        Self {
            finished_at,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Body of `PATCH /tasks/{id}`
///
/// Only fields that are `Some` are sent. A nested `None` is sent as an
/// explicit `null` and clears the field remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Option<Priority>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

/// The remote operation that confirms an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Update(TaskUpdate),
    Finalize(FinalizeRequest),
}

/// One optimistic change to a single task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    /// Assign to a user, or unassign with `None`
    AssignTo(Option<UserRef>),
    SetPriority(Option<Priority>),
    /// Move the start timestamp
    Reschedule(DateTime<Utc>),
    /// Mark clean. Releases the assignment.
    Finalize(FinalizeRequest),
    /// Mark dirty. Keeps the assignment.
    Reopen,
    SetNotes(Option<String>),
}

impl MutationIntent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AssignTo(_) => "assign",
            Self::SetPriority(_) => "set_priority",
            Self::Reschedule(_) => "reschedule",
            Self::Finalize(_) => "finalize",
            Self::Reopen => "reopen",
            Self::SetNotes(_) => "set_notes",
        }
    }

    /// Local checks performed before anything is patched or sent.
    ///
    /// Business rules such as "finished after started" are left to the
    /// remote service.
    pub fn validate(&self) -> Result<()> {
        let notes = match self {
            Self::SetNotes(Some(notes)) => Some(notes),
            Self::Finalize(req) => req.notes.as_ref(),
            _ => None,
        };
        if let Some(notes) = notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(Error::InvalidInput(format!(
                    "Notes exceed {MAX_NOTES_LEN} characters"
                )));
            }
        }
        if let Self::AssignTo(Some(user)) = self {
            if user.name.trim().is_empty() {
                return Err(Error::InvalidInput("Assignee name cannot be empty".into()));
            }
        }
        Ok(())
    }

    /// Apply the optimistic patch to a cached task
    pub fn apply(&self, task: &mut CleaningTask) {
        match self {
            Self::AssignTo(user) => task.assignee = user.clone(),
            Self::SetPriority(priority) => task.priority = *priority,
            Self::Reschedule(started_at) => task.started_at = *started_at,
            Self::Finalize(req) => {
                task.finished_at = Some(req.finished_at);
                task.assignee = None;
                if let Some(notes) = &req.notes {
                    task.notes = Some(notes.clone());
                }
            }
            Self::Reopen => task.finished_at = None,
            Self::SetNotes(notes) => task.notes = notes.clone(),
        }
    }

    pub fn remote_call(&self) -> RemoteCall {
        match self {
            Self::Finalize(req) => RemoteCall::Finalize(req.clone()),
            Self::AssignTo(user) => RemoteCall::Update(TaskUpdate {
                assignee_id: Some(user.as_ref().map(|u| u.id)),
                ..TaskUpdate::default()
            }),
            Self::SetPriority(priority) => RemoteCall::Update(TaskUpdate {
                priority: Some(*priority),
                ..TaskUpdate::default()
            }),
            Self::Reschedule(started_at) => RemoteCall::Update(TaskUpdate {
                started_at: Some(*started_at),
                ..TaskUpdate::default()
            }),
            Self::Reopen => RemoteCall::Update(TaskUpdate {
                finished_at: Some(None),
                ..TaskUpdate::default()
            }),
            Self::SetNotes(notes) => RemoteCall::Update(TaskUpdate {
                notes: Some(notes.clone()),
                ..TaskUpdate::default()
            }),
        }
    }
}
