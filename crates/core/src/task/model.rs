//! Cleaning task model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a task, assigned by the remote service
pub type TaskId = u64;

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Ordinal used for sorting, low to urgent
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown priority: {other}"
            ))),
        }
    }
}

/// Room a task belongs to. Read-only from the client's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRef {
    pub id: u64,
    pub number: String,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub type_name: Option<String>,
}

/// A user a task can be assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: u64,
    pub name: String,
}

/// Clean/dirty status, always derived from `finished_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanStatus {
    Clean,
    Dirty,
}

impl CleanStatus {
    /// Display name used by the remote service
    pub fn name(self) -> &'static str {
        match self {
            Self::Clean => "Limpia",
            Self::Dirty => "Sucia",
        }
    }
}

/// A housekeeping task for one room
///
/// The remote payload also carries a `status` object; it is ignored on
/// deserialization and recomputed from `finished_at` by [`CleaningTask::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningTask {
    pub id: TaskId,
    pub room: RoomRef,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assignee: Option<UserRef>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CleaningTask {
    /// Create a dirty, unassigned task for the given room
    pub fn new(id: TaskId, room: RoomRef, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            room,
            priority: None,
            assignee: None,
            started_at,
            finished_at: None,
            notes: None,
        }
    }

    pub fn status(&self) -> CleanStatus {
        if self.finished_at.is_some() {
            CleanStatus::Clean
        } else {
            CleanStatus::Dirty
        }
    }

    pub fn is_clean(&self) -> bool {
        self.status() == CleanStatus::Clean
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the assignee
    pub fn with_assignee(mut self, assignee: UserRef) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Mark the task as finished at the given time
    pub fn with_finished_at(mut self, finished_at: DateTime<Utc>) -> Self {
        self.finished_at = Some(finished_at);
        self
    }

    /// Set the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
