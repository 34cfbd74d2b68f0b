//! Pending conversation state
//!
//! One inbound message can open a short-lived follow-up (a confirmation, a
//! duration question, the recap flow). The follow-up is keyed by session and
//! consumed by the very next message from that sender.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::activity::LifeDomain;
use crate::types::intent::DeleteScope;

/// What the next message from a session is expected to answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingState {
    /// "Reply YES to confirm" for a bulk task delete.
    ConfirmDeleteTasks { scope: DeleteScope },
    /// "Reply YES to confirm" for a bulk activity delete.
    ConfirmDeleteActivities { scope: DeleteScope },
    /// "How long did it take?" after completing a task.
    AwaitingDuration { task_id: Uuid, task_title: String, domain: LifeDomain },
    /// "What was your screen time today?" before the daily recap.
    AwaitingScreenTime,
}

/// A pending state plus the instant it was set, for TTL enforcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub state: PendingState,
    pub created_at: DateTime<Utc>,
}
