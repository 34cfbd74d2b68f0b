//! Port interfaces for task and activity storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daybook_domain::{Activity, ActivityChange, Result, Task, TaskChange};
use uuid::Uuid;

/// Due-date filter for task queries and bulk deletes
///
/// Tasks without a due date match only [`TaskDueFilter::Any`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskDueFilter {
    /// Due exactly on the given date.
    On(chrono::NaiveDate),
    /// Due on or before the given date.
    Through(chrono::NaiveDate),
    /// No due-date condition.
    Any,
}

/// Trait for persisting tasks
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Save a new task
    async fn insert(&self, task: &Task) -> Result<()>;

    /// Most recently created open task whose title contains `needle`
    /// (case-insensitive)
    async fn find_open_matching(&self, needle: &str) -> Result<Option<Task>>;

    /// Most recently created task of any status whose title contains
    /// `needle` (case-insensitive)
    async fn find_any_matching(&self, needle: &str) -> Result<Option<Task>>;

    /// Mark a task completed at the given instant
    async fn set_completed(&self, id: Uuid, completed_at: DateTime<Utc>) -> Result<()>;

    /// Apply a single-field edit
    async fn apply_change(&self, id: Uuid, change: &TaskChange) -> Result<()>;

    /// Delete one task
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// Delete every task (any status) whose due date matches the filter
    async fn remove_due(&self, filter: TaskDueFilter) -> Result<()>;

    /// Open tasks matching the filter, ordered important-first, then by due
    /// date and due time with absent values last
    async fn list_open(&self, filter: TaskDueFilter) -> Result<Vec<Task>>;

    /// Tasks completed at or after the given instant
    async fn completed_since(&self, since: DateTime<Utc>) -> Result<Vec<Task>>;
}

/// Trait for persisting activities
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Save a new activity
    async fn insert(&self, activity: &Activity) -> Result<()>;

    /// Activities ending at or after the given instant, oldest first
    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<Activity>>;

    /// Most recent activity ending at or after the given instant, optionally
    /// restricted to descriptions containing `needle` (case-insensitive)
    async fn find_latest_since(
        &self,
        since: DateTime<Utc>,
        needle: Option<&str>,
    ) -> Result<Option<Activity>>;

    /// Apply a single-field edit
    async fn apply_change(&self, id: Uuid, change: &ActivityChange) -> Result<()>;

    /// Delete one activity
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// Delete every activity ending at or after the given instant
    async fn remove_since(&self, since: DateTime<Utc>) -> Result<()>;

    /// Delete every activity
    async fn remove_all(&self) -> Result<()>;
}
