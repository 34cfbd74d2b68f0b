//! SQLite-backed activity repository.
//!
//! Implements the async `ActivityRepository` port over the shared connection
//! pool. Activities are keyed by their end instant (`created_at`), so every
//! time filter here is a plain timestamp comparison.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daybook_core::ActivityRepository as ActivityRepositoryPort;
use daybook_domain::{
    Activity, ActivityChange, DaybookError, LifeDomain, Result as DomainResult,
};
use rusqlite::{params, Connection, Row};
use tokio::task;
use uuid::Uuid;

use super::manager::DbManager;
use crate::errors::InfraError;

/// Async activity repository backed by SQLite.
pub struct SqliteActivityRepository {
    db: Arc<DbManager>,
}

impl SqliteActivityRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityRepositoryPort for SqliteActivityRepository {
    async fn insert(&self, activity: &Activity) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let activity = activity.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            insert_activity(&conn, &activity).map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<Activity>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<Vec<Activity>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(LIST_SINCE_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![since.timestamp()], map_activity_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_latest_since(
        &self,
        since: DateTime<Utc>,
        needle: Option<&str>,
    ) -> DomainResult<Option<Activity>> {
        let db = Arc::clone(&self.db);
        let needle = needle.map(str::to_string);
        task::spawn_blocking(move || -> DomainResult<Option<Activity>> {
            let conn = db.get_connection()?;
            find_latest(&conn, since.timestamp(), needle.as_deref()).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn apply_change(&self, id: Uuid, change: &ActivityChange) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let change = change.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            update_activity_field(&conn, id, &change).map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn remove(&self, id: Uuid) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM activities WHERE id = ?1", params![id.to_string()])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn remove_since(&self, since: DateTime<Utc>) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let deleted = conn
                .execute(
                    "DELETE FROM activities WHERE created_at >= ?1",
                    params![since.timestamp()],
                )
                .map_err(map_sql_error)?;
            tracing::debug!(deleted, "bulk activity delete");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn remove_all(&self) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let deleted = conn.execute("DELETE FROM activities", []).map_err(map_sql_error)?;
            tracing::debug!(deleted, "bulk activity delete");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

const INSERT_ACTIVITY_SQL: &str = "INSERT INTO activities (
        id, domain, duration_minutes, description, created_at, raw_message
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const LIST_SINCE_SQL: &str = "SELECT id, domain, duration_minutes, description, created_at, raw_message
    FROM activities
    WHERE created_at >= ?1
    ORDER BY created_at";

const LATEST_SINCE_SQL: &str = "SELECT id, domain, duration_minutes, description, created_at, raw_message
    FROM activities
    WHERE created_at >= ?1
    ORDER BY created_at DESC
    LIMIT 1";

const LATEST_MATCHING_SQL: &str = "SELECT id, domain, duration_minutes, description, created_at, raw_message
    FROM activities
    WHERE created_at >= ?1 AND LOWER(description) LIKE '%' || LOWER(?2) || '%'
    ORDER BY created_at DESC
    LIMIT 1";

fn insert_activity(conn: &Connection, activity: &Activity) -> rusqlite::Result<()> {
    conn.execute(
        INSERT_ACTIVITY_SQL,
        params![
            activity.id.to_string(),
            activity.domain.as_str(),
            activity.duration_minutes,
            activity.description,
            activity.created_at.timestamp(),
            activity.raw_message,
        ],
    )?;
    Ok(())
}

fn find_latest(
    conn: &Connection,
    since_ts: i64,
    needle: Option<&str>,
) -> rusqlite::Result<Option<Activity>> {
    match needle {
        Some(needle) => {
            let mut stmt = conn.prepare(LATEST_MATCHING_SQL)?;
            let mut rows = stmt.query_map(params![since_ts, needle], map_activity_row)?;
            rows.next().transpose()
        }
        None => {
            let mut stmt = conn.prepare(LATEST_SINCE_SQL)?;
            let mut rows = stmt.query_map(params![since_ts], map_activity_row)?;
            rows.next().transpose()
        }
    }
}

fn update_activity_field(
    conn: &Connection,
    id: Uuid,
    change: &ActivityChange,
) -> rusqlite::Result<usize> {
    let id = id.to_string();
    match change {
        ActivityChange::DurationMinutes(minutes) => conn.execute(
            "UPDATE activities SET duration_minutes = ?2 WHERE id = ?1",
            params![id, minutes],
        ),
        ActivityChange::Domain(domain) => conn.execute(
            "UPDATE activities SET domain = ?2 WHERE id = ?1",
            params![id, domain.as_str()],
        ),
        ActivityChange::Description(description) => conn.execute(
            "UPDATE activities SET description = ?2 WHERE id = ?1",
            params![id, description],
        ),
    }
}

fn map_activity_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    let id: String = row.get(0)?;
    let domain: String = row.get(1)?;
    let created_at: i64 = row.get(4)?;

    Ok(Activity {
        id: parse_uuid(0, &id)?,
        domain: LifeDomain::parse(&domain)
            .ok_or_else(|| column_error(1, "unknown life domain"))?,
        duration_minutes: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_timestamp(4, created_at)?,
        raw_message: row.get(5)?,
    })
}

fn parse_uuid(column: usize, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value).map_err(|err| {
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
        rusqlite::types::Type::Text,
        message.to_string().into(),
    )
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
