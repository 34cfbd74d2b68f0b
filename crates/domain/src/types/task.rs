//! Scheduled task records

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// A scheduled to-do item
///
/// `completed_at` is set exactly once, when the task transitions to
/// [`TaskStatus::Completed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub important: bool,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Verbatim message that created the record.
    pub raw_message: String,
}

impl Task {
    /// Create a new open task with a fresh id.
    pub fn new(
        title: impl Into<String>,
        due_date: Option<NaiveDate>,
        due_time: Option<NaiveTime>,
        important: bool,
        raw_message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            due_date,
            due_time,
            important,
            status: TaskStatus::Open,
            completed_at: None,
            created_at,
            raw_message: raw_message.into(),
        }
    }
}
