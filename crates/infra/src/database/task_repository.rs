//! SQLite-backed task repository.
//!
//! Implements the async `TaskRepository` port over the shared connection
//! pool. Queries run on the blocking thread pool via `spawn_blocking`; row
//! mapping converts the TEXT/INTEGER storage encoding back into domain types.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use daybook_core::{TaskDueFilter, TaskRepository as TaskRepositoryPort};
use daybook_domain::{DaybookError, Result as DomainResult, Task, TaskChange, TaskStatus};
use rusqlite::{params, Connection, Row, ToSql};
use tokio::task;
use uuid::Uuid;

use super::manager::DbManager;
use crate::errors::InfraError;

/// Async task repository backed by SQLite.
pub struct SqliteTaskRepository {
    db: Arc<DbManager>,
}

impl SqliteTaskRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepositoryPort for SqliteTaskRepository {
    async fn insert(&self, task: &Task) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let task = task.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            insert_task(&conn, &task).map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_open_matching(&self, needle: &str) -> DomainResult<Option<Task>> {
        let db = Arc::clone(&self.db);
        let needle = needle.to_string();
        task::spawn_blocking(move || -> DomainResult<Option<Task>> {
            let conn = db.get_connection()?;
            find_matching(&conn, FIND_OPEN_MATCHING_SQL, &needle).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_any_matching(&self, needle: &str) -> DomainResult<Option<Task>> {
        let db = Arc::clone(&self.db);
        let needle = needle.to_string();
        task::spawn_blocking(move || -> DomainResult<Option<Task>> {
            let conn = db.get_connection()?;
            find_matching(&conn, FIND_ANY_MATCHING_SQL, &needle).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_completed(&self, id: Uuid, completed_at: DateTime<Utc>) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE tasks SET status = 'completed', completed_at = ?2 WHERE id = ?1",
                params![id.to_string(), completed_at.timestamp()],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn apply_change(&self, id: Uuid, change: &TaskChange) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let change = change.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            update_task_field(&conn, id, &change).map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn remove(&self, id: Uuid) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn remove_due(&self, filter: TaskDueFilter) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let deleted = match filter {
                TaskDueFilter::On(date) => conn.execute(
                    "DELETE FROM tasks WHERE due_date = ?1",
                    params![format_date(date)],
                ),
                TaskDueFilter::Through(date) => conn.execute(
                    "DELETE FROM tasks WHERE due_date IS NOT NULL AND due_date <= ?1",
                    params![format_date(date)],
                ),
                TaskDueFilter::Any => conn.execute("DELETE FROM tasks", []),
            }
            .map_err(map_sql_error)?;
            tracing::debug!(deleted, "bulk task delete");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_open(&self, filter: TaskDueFilter) -> DomainResult<Vec<Task>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<Vec<Task>> {
            let conn = db.get_connection()?;
            query_open_tasks(&conn, filter).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn completed_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<Task>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<Vec<Task>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(COMPLETED_SINCE_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![since.timestamp()], map_task_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(map_join_error)?
    }
}

const TASK_COLUMNS: &str = "id, title, due_date, due_time, important, status,
        completed_at, created_at, raw_message";

const INSERT_TASK_SQL: &str = "INSERT INTO tasks (
        id, title, due_date, due_time, important, status,
        completed_at, created_at, raw_message
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

const FIND_OPEN_MATCHING_SQL: &str = "SELECT id, title, due_date, due_time, important, status,
        completed_at, created_at, raw_message
    FROM tasks
    WHERE status = 'open' AND LOWER(title) LIKE '%' || LOWER(?1) || '%'
    ORDER BY created_at DESC
    LIMIT 1";

const FIND_ANY_MATCHING_SQL: &str = "SELECT id, title, due_date, due_time, important, status,
        completed_at, created_at, raw_message
    FROM tasks
    WHERE LOWER(title) LIKE '%' || LOWER(?1) || '%'
    ORDER BY created_at DESC
    LIMIT 1";

const COMPLETED_SINCE_SQL: &str = "SELECT id, title, due_date, due_time, important, status,
        completed_at, created_at, raw_message
    FROM tasks
    WHERE status = 'completed' AND completed_at >= ?1
    ORDER BY completed_at";

// Open tasks sort important-first, then by due date and time with absent
// values last. `x IS NULL` evaluates to 0/1, which pushes NULLs behind
// concrete values before the ascending comparison applies.
const LIST_OPEN_ORDER: &str = "ORDER BY important DESC,
        due_date IS NULL, due_date ASC,
        due_time IS NULL, due_time ASC";

fn insert_task(conn: &Connection, task: &Task) -> rusqlite::Result<()> {
    conn.execute(
        INSERT_TASK_SQL,
        params![
            task.id.to_string(),
            task.title,
            task.due_date.map(format_date),
            task.due_time.map(format_time),
            i64::from(task.important),
            task.status.as_str(),
            task.completed_at.map(|at| at.timestamp()),
            task.created_at.timestamp(),
            task.raw_message,
        ],
    )?;
    Ok(())
}

fn find_matching(conn: &Connection, sql: &str, needle: &str) -> rusqlite::Result<Option<Task>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query_map(params![needle], map_task_row)?;
    rows.next().transpose()
}

fn update_task_field(conn: &Connection, id: Uuid, change: &TaskChange) -> rusqlite::Result<usize> {
    let id = id.to_string();
    match change {
        TaskChange::Title(title) => {
            conn.execute("UPDATE tasks SET title = ?2 WHERE id = ?1", params![id, title])
        }
        TaskChange::DueDate(date) => conn.execute(
            "UPDATE tasks SET due_date = ?2 WHERE id = ?1",
            params![id, date.map(format_date)],
        ),
        TaskChange::DueTime(time) => conn.execute(
            "UPDATE tasks SET due_time = ?2 WHERE id = ?1",
            params![id, time.map(format_time)],
        ),
        TaskChange::Important(flag) => conn.execute(
            "UPDATE tasks SET important = ?2 WHERE id = ?1",
            params![id, i64::from(*flag)],
        ),
    }
}

fn query_open_tasks(conn: &Connection, filter: TaskDueFilter) -> rusqlite::Result<Vec<Task>> {
    let (condition, date_param) = match filter {
        TaskDueFilter::On(date) => ("AND due_date = ?1", Some(format_date(date))),
        TaskDueFilter::Through(date) => {
            ("AND due_date IS NOT NULL AND due_date <= ?1", Some(format_date(date)))
        }
        TaskDueFilter::Any => ("", None),
    };

    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE status = 'open' {condition} {LIST_OPEN_ORDER}"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = match &date_param {
        Some(date) => {
            let params: [&dyn ToSql; 1] = [date];
            stmt.query_map(params.as_slice(), map_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => stmt.query_map([], map_task_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
    };
    Ok(rows)
}

fn map_task_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let id: String = row.get(0)?;
    let due_date: Option<String> = row.get(2)?;
    let due_time: Option<String> = row.get(3)?;
    let status: String = row.get(5)?;
    let completed_at: Option<i64> = row.get(6)?;
    let created_at: i64 = row.get(7)?;

    Ok(Task {
        id: parse_uuid(0, &id)?,
        title: row.get(1)?,
        due_date: due_date.as_deref().map(|s| parse_date(2, s)).transpose()?,
        due_time: due_time.as_deref().map(|s| parse_time(3, s)).transpose()?,
        important: int_to_bool(row.get(4)?),
        status: TaskStatus::parse(&status).ok_or_else(|| column_error(5, "unknown task status"))?,
        completed_at: completed_at.map(|ts| parse_timestamp(6, ts)).transpose()?,
        created_at: parse_timestamp(7, created_at)?,
        raw_message: row.get(8)?,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn parse_uuid(column: usize, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(err),
        ))
}

fn parse_date(column: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
    })
}

fn parse_time(column: usize, value: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
    })
}

fn parse_timestamp(column: usize, seconds: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| column_error(column, "timestamp out of range"))
}

fn column_error(column: usize, message: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Integer,
        message.to_string().into(),
    )
}

fn int_to_bool(value: i64) -> bool {
    value != 0
}

fn map_sql_error(err: rusqlite::Error) -> DaybookError {
    DaybookError::from(InfraError::from(err))
}

fn map_join_error(err: task::JoinError) -> DaybookError {
    if err.is_cancelled() {
        DaybookError::Internal("blocking repository task cancelled".into())
    } else {
        DaybookError::Internal(format!("blocking repository task failed: {err}"))
    }
}
