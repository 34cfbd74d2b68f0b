//! Mock repository implementations for testing
//!
//! In-memory mocks for the task and activity ports, enabling deterministic
//! dispatcher tests without database dependencies. State is shared across
//! clones so a test can seed and inspect the same store the dispatcher uses.

use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daybook_core::records::ports::{ActivityRepository, TaskDueFilter, TaskRepository};
use daybook_domain::{
    Activity, ActivityChange, DaybookError, Result as DomainResult, Task, TaskChange, TaskStatus,
};
use parking_lot::Mutex;
use uuid::Uuid;

fn contains_insensitive(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn write_guard(fail: &Mutex<bool>) -> DomainResult<()> {
    if *fail.lock() {
        return Err(DaybookError::Database("simulated write failure".to_string()));
    }
    Ok(())
}

/// In-memory mock for `TaskRepository`.
#[derive(Default, Clone)]
pub struct InMemoryTaskRepository {
    tasks: Arc<Mutex<Vec<Task>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a task directly, bypassing the port.
    pub fn seed(&self, task: Task) {
        self.tasks.lock().push(task);
    }

    /// Make every subsequent write fail with a database error.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Snapshot of the stored tasks, in insertion order.
    pub fn all(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }

    fn latest_matching(&self, needle: &str, open_only: bool) -> Option<Task> {
        let tasks = self.tasks.lock();
        tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| !open_only || task.status == TaskStatus::Open)
            .filter(|(_, task)| contains_insensitive(&task.title, needle))
            .max_by_key(|(index, task)| (task.created_at, *index))
            .map(|(_, task)| task.clone())
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: &Task) -> DomainResult<()> {
        write_guard(&self.fail_writes)?;
        self.tasks.lock().push(task.clone());
        Ok(())
    }

    async fn find_open_matching(&self, needle: &str) -> DomainResult<Option<Task>> {
        Ok(self.latest_matching(needle, true))
    }

    async fn find_any_matching(&self, needle: &str) -> DomainResult<Option<Task>> {
        Ok(self.latest_matching(needle, false))
    }

    async fn set_completed(&self, id: Uuid, completed_at: DateTime<Utc>) -> DomainResult<()> {
        write_guard(&self.fail_writes)?;
        if let Some(task) = self.tasks.lock().iter_mut().find(|task| task.id == id) {
            task.status = TaskStatus::Completed;
            task.completed_at = Some(completed_at);
        }
        Ok(())
    }

    async fn apply_change(&self, id: Uuid, change: &TaskChange) -> DomainResult<()> {
        write_guard(&self.fail_writes)?;
        if let Some(task) = self.tasks.lock().iter_mut().find(|task| task.id == id) {
            match change {
                TaskChange::Title(title) => task.title = title.clone(),
                TaskChange::DueDate(date) => task.due_date = *date,
                TaskChange::DueTime(time) => task.due_time = *time,
                TaskChange::Important(flag) => task.important = *flag,
            }
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> DomainResult<()> {
        write_guard(&self.fail_writes)?;
        self.tasks.lock().retain(|task| task.id != id);
        Ok(())
    }

    async fn remove_due(&self, filter: TaskDueFilter) -> DomainResult<()> {
        write_guard(&self.fail_writes)?;
        self.tasks.lock().retain(|task| match filter {
            TaskDueFilter::On(date) => task.due_date != Some(date),
            TaskDueFilter::Through(date) => !task.due_date.is_some_and(|due| due <= date),
            TaskDueFilter::Any => false,
        });
        Ok(())
    }

    async fn list_open(&self, filter: TaskDueFilter) -> DomainResult<Vec<Task>> {
        let mut matching: Vec<Task> = self
            .tasks
            .lock()
            .iter()
            .filter(|task| task.status == TaskStatus::Open)
            .filter(|task| match filter {
                TaskDueFilter::On(date) => task.due_date == Some(date),
                TaskDueFilter::Through(date) => task.due_date.is_some_and(|due| due <= date),
                TaskDueFilter::Any => true,
            })
            .cloned()
            .collect();
        matching.sort_by_key(|task| {
            (
                Reverse(task.important),
                task.due_date.is_none(),
                task.due_date,
                task.due_time.is_none(),
                task.due_time,
            )
        });
        Ok(matching)
    }

    async fn completed_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .iter()
            .filter(|task| task.status == TaskStatus::Completed)
            .filter(|task| task.completed_at.is_some_and(|at| at >= since))
            .cloned()
            .collect())
    }
}

/// In-memory mock for `ActivityRepository`.
#[derive(Default, Clone)]
pub struct InMemoryActivityRepository {
    activities: Arc<Mutex<Vec<Activity>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl InMemoryActivityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an activity directly, bypassing the port.
    pub fn seed(&self, activity: Activity) {
        self.activities.lock().push(activity);
    }

    /// Make every subsequent write fail with a database error.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Snapshot of the stored activities, in insertion order.
    pub fn all(&self) -> Vec<Activity> {
        self.activities.lock().clone()
    }
}

#[async_trait]
impl ActivityRepository for InMemoryActivityRepository {
    async fn insert(&self, activity: &Activity) -> DomainResult<()> {
        write_guard(&self.fail_writes)?;
        self.activities.lock().push(activity.clone());
        Ok(())
    }

    async fn list_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<Activity>> {
        let mut matching: Vec<Activity> = self
            .activities
            .lock()
            .iter()
            .filter(|activity| activity.created_at >= since)
            .cloned()
            .collect();
        matching.sort_by_key(|activity| activity.created_at);
        Ok(matching)
    }

    async fn find_latest_since(
        &self,
        since: DateTime<Utc>,
        needle: Option<&str>,
    ) -> DomainResult<Option<Activity>> {
        let activities = self.activities.lock();
        Ok(activities
            .iter()
            .enumerate()
            .filter(|(_, activity)| activity.created_at >= since)
            .filter(|(_, activity)| {
                needle.map_or(true, |needle| contains_insensitive(&activity.description, needle))
            })
            .max_by_key(|(index, activity)| (activity.created_at, *index))
            .map(|(_, activity)| activity.clone()))
    }

    async fn apply_change(&self, id: Uuid, change: &ActivityChange) -> DomainResult<()> {
        write_guard(&self.fail_writes)?;
        if let Some(activity) = self.activities.lock().iter_mut().find(|activity| activity.id == id)
        {
            match change {
                ActivityChange::DurationMinutes(minutes) => activity.duration_minutes = *minutes,
                ActivityChange::Domain(domain) => activity.domain = *domain,
                ActivityChange::Description(description) => {
                    activity.description = description.clone();
                }
            }
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> DomainResult<()> {
        write_guard(&self.fail_writes)?;
        self.activities.lock().retain(|activity| activity.id != id);
        Ok(())
    }

    async fn remove_since(&self, since: DateTime<Utc>) -> DomainResult<()> {
        write_guard(&self.fail_writes)?;
        self.activities.lock().retain(|activity| activity.created_at < since);
        Ok(())
    }

    async fn remove_all(&self) -> DomainResult<()> {
        write_guard(&self.fail_writes)?;
        self.activities.lock().clear();
        Ok(())
    }
}
