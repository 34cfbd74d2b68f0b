//! Typed intent model
//!
//! The classifier returns loosely structured JSON (`{ "type": ..., "data":
//! ... }`). This module normalizes that payload into a closed union with
//! per-intent slot schemas. Anything malformed, partial, or unrecognized
//! becomes [`Intent::Unknown`], so handlers never see a half-valid command.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::activity::LifeDomain;

/// Scope selector for bulk deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteScope {
    Today,
    ThisWeek,
    All,
}

impl DeleteScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::ThisWeek => "this_week",
            Self::All => "all",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "today" => Some(Self::Today),
            "this_week" => Some(Self::ThisWeek),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Timeframe selector for task queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTimeframe {
    Today,
    Tomorrow,
    ThisWeek,
    All,
}

impl QueryTimeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::ThisWeek => "this_week",
            Self::All => "all",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "today" => Some(Self::Today),
            "tomorrow" => Some(Self::Tomorrow),
            "this_week" => Some(Self::ThisWeek),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Single-field change applied by a task edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskChange {
    Title(String),
    DueDate(Option<NaiveDate>),
    DueTime(Option<NaiveTime>),
    Important(bool),
}

impl TaskChange {
    /// Wire name of the edited field, used in confirmation replies.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::DueDate(_) => "due_date",
            Self::DueTime(_) => "due_time",
            Self::Important(_) => "important",
        }
    }

    /// Rendering of the new value, used in confirmation replies.
    pub fn value_label(&self) -> String {
        match self {
            Self::Title(title) => title.clone(),
            Self::DueDate(Some(date)) => date.format("%Y-%m-%d").to_string(),
            Self::DueTime(Some(time)) => time.format("%H:%M").to_string(),
            Self::DueDate(None) | Self::DueTime(None) => "none".to_string(),
            Self::Important(flag) => flag.to_string(),
        }
    }
}

/// Single-field change applied by an activity edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivityChange {
    DurationMinutes(i64),
    Domain(LifeDomain),
    Description(String),
}

impl ActivityChange {
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::DurationMinutes(_) => "duration_minutes",
            Self::Domain(_) => "domain",
            Self::Description(_) => "description",
        }
    }

    pub fn value_label(&self) -> String {
        match self {
            Self::DurationMinutes(minutes) => minutes.to_string(),
            Self::Domain(domain) => domain.as_str().to_string(),
            Self::Description(description) => description.clone(),
        }
    }
}

/// Which of today's activities an edit or delete addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityTarget {
    /// The most recently logged activity.
    Last,
    /// Case-insensitive substring match on the description.
    Matching(String),
}

impl ActivityTarget {
    /// Rendering used when quoting the target back to the user.
    pub fn label(&self) -> &str {
        match self {
            Self::Last => "last",
            Self::Matching(needle) => needle,
        }
    }
}

/// A fully typed user command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Intent {
    TaskCreate {
        title: String,
        due_date: Option<NaiveDate>,
        due_time: Option<NaiveTime>,
        important: bool,
    },
    TaskComplete {
        task_identifier: String,
        /// Domain inferred for the follow-up activity log. `None` falls back
        /// to [`LifeDomain::Admin`] at dispatch.
        domain: Option<LifeDomain>,
    },
    TaskEdit {
        task_identifier: String,
        change: TaskChange,
    },
    TaskDelete {
        task_identifier: String,
    },
    TaskDeleteAll {
        scope: DeleteScope,
    },
    TaskQuery {
        timeframe: QueryTimeframe,
    },
    ActivityLog {
        domain: LifeDomain,
        /// Minutes spent. `None` falls back to the 30-minute default.
        duration_minutes: Option<i64>,
        description: String,
        /// Clock time the activity finished, when stated outright.
        end_time: Option<NaiveTime>,
        /// The activity started when the previous one ended.
        relative_to_last: bool,
    },
    ActivityEdit {
        target: ActivityTarget,
        change: ActivityChange,
    },
    ActivityDelete {
        target: ActivityTarget,
    },
    ActivityDeleteAll {
        scope: DeleteScope,
    },
    SummaryRequest,
    Status,
    Help,
    Unknown,
}

impl Intent {
    /// Wire name of the command type, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TaskCreate { .. } => "task_create",
            Self::TaskComplete { .. } => "task_complete",
            Self::TaskEdit { .. } => "task_edit",
            Self::TaskDelete { .. } => "task_delete",
            Self::TaskDeleteAll { .. } => "task_delete_all",
            Self::TaskQuery { .. } => "task_query",
            Self::ActivityLog { .. } => "activity_log",
            Self::ActivityEdit { .. } => "activity_edit",
            Self::ActivityDelete { .. } => "activity_delete",
            Self::ActivityDeleteAll { .. } => "activity_delete_all",
            Self::SummaryRequest => "summary_request",
            Self::Status => "status",
            Self::Help => "help",
            Self::Unknown => "unknown",
        }
    }

    /// Normalize raw classifier output.
    ///
    /// A payload that does not satisfy the slot schema of its declared type
    /// collapses to `Unknown`: a command is either fully valid or not a
    /// command at all, never partially applied.
    pub fn from_classifier_value(value: &Value) -> Self {
        Self::try_from_value(value).unwrap_or(Self::Unknown)
    }

    fn try_from_value(value: &Value) -> Option<Self> {
        let kind = value.get("type")?.as_str()?;
        let null = Value::Null;
        let data = value.get("data").unwrap_or(&null);

        let intent = match kind {
            "task_create" => Self::TaskCreate {
                title: required_str(data, "title")?,
                due_date: optional_date(data, "due_date")?,
                due_time: optional_time(data, "due_time")?,
                important: data.get("important").and_then(Value::as_bool).unwrap_or(false),
            },
            "task_complete" => Self::TaskComplete {
                task_identifier: required_str(data, "task_identifier")?,
                domain: data.get("domain").and_then(Value::as_str).and_then(LifeDomain::parse),
            },
            "task_edit" => Self::TaskEdit {
                task_identifier: required_str(data, "task_identifier")?,
                change: task_change(data)?,
            },
            "task_delete" => {
                Self::TaskDelete { task_identifier: required_str(data, "task_identifier")? }
            }
            "task_delete_all" => Self::TaskDeleteAll { scope: scope_or_today(data)? },
            "task_query" => Self::TaskQuery { timeframe: timeframe_or_all(data)? },
            "activity_log" => Self::ActivityLog {
                domain: LifeDomain::parse(&required_str(data, "domain")?)?,
                duration_minutes: optional_minutes(data, "duration_minutes")?,
                description: required_str(data, "description")?,
                end_time: optional_time(data, "end_time")?,
                relative_to_last: data
                    .get("is_relative_to_last")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            "activity_edit" => {
                Self::ActivityEdit { target: activity_target(data)?, change: activity_change(data)? }
            }
            "activity_delete" => Self::ActivityDelete { target: activity_target(data)? },
            "activity_delete_all" => Self::ActivityDeleteAll { scope: scope_or_today(data)? },
            "summary_request" => Self::SummaryRequest,
            "status" => Self::Status,
            "help" => Self::Help,
            _ => return None,
        };
        Some(intent)
    }
}

/// Classifier output: the normalized intent plus the raw payload, which the
/// test endpoint echoes back for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub raw: Value,
}

impl Classification {
    pub fn from_value(raw: Value) -> Self {
        let intent = Intent::from_classifier_value(&raw);
        Self { intent, raw }
    }

    /// Fallback when no JSON object could be extracted from the completion.
    pub fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            raw: serde_json::json!({ "type": "unknown", "data": {} }),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required_str(data: &Value, key: &str) -> Option<String> {
    non_empty(data.get(key)?.as_str()?)
}

// The `nullable_*` helpers distinguish "absent" from "present but garbage":
// absent/null yields `Some(None)` so the slot stays empty, while an
// unparseable value yields `None` and the whole payload degrades to Unknown.

fn nullable_date(value: &Value) -> Option<Option<NaiveDate>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) if s.trim().is_empty() => Some(None),
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok().map(Some),
        _ => None,
    }
}

fn nullable_time(value: &Value) -> Option<Option<NaiveTime>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) if s.trim().is_empty() => Some(None),
        Value::String(s) => {
            let trimmed = s.trim();
            NaiveTime::parse_from_str(trimmed, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
                .ok()
                .map(Some)
        }
        _ => None,
    }
}

fn optional_date(data: &Value, key: &str) -> Option<Option<NaiveDate>> {
    match data.get(key) {
        None => Some(None),
        Some(value) => nullable_date(value),
    }
}

fn optional_time(data: &Value, key: &str) -> Option<Option<NaiveTime>> {
    match data.get(key) {
        None => Some(None),
        Some(value) => nullable_time(value),
    }
}

/// Positive minute counts only; the duration invariant rejects zero and
/// negative values.
fn flexible_minutes(value: &Value) -> Option<i64> {
    let minutes = match value {
        Value::Number(_) => value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (minutes > 0).then_some(minutes)
}

fn optional_minutes(data: &Value, key: &str) -> Option<Option<i64>> {
    match data.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(value) => flexible_minutes(value).map(Some),
    }
}

fn flexible_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn scope_or_today(data: &Value) -> Option<DeleteScope> {
    match data.get("scope") {
        None | Some(Value::Null) => Some(DeleteScope::Today),
        Some(value) => DeleteScope::parse(value.as_str()?),
    }
}

fn timeframe_or_all(data: &Value) -> Option<QueryTimeframe> {
    match data.get("timeframe") {
        None | Some(Value::Null) => Some(QueryTimeframe::All),
        Some(value) => QueryTimeframe::parse(value.as_str()?),
    }
}

fn activity_target(data: &Value) -> Option<ActivityTarget> {
    let target = required_str(data, "target_description")?;
    if target == "last" {
        Some(ActivityTarget::Last)
    } else {
        Some(ActivityTarget::Matching(target))
    }
}

fn task_change(data: &Value) -> Option<TaskChange> {
    let field = data.get("field")?.as_str()?;
    let value = data.get("new_value")?;
    let change = match field {
        "title" => TaskChange::Title(non_empty(value.as_str()?)?),
        "due_date" => TaskChange::DueDate(nullable_date(value)?),
        "due_time" => TaskChange::DueTime(nullable_time(value)?),
        "important" => TaskChange::Important(flexible_bool(value)?),
        _ => return None,
    };
    Some(change)
}

fn activity_change(data: &Value) -> Option<ActivityChange> {
    let field = data.get("field")?.as_str()?;
    let value = data.get("new_value")?;
    let change = match field {
        "duration_minutes" => ActivityChange::DurationMinutes(flexible_minutes(value)?),
        "domain" => ActivityChange::Domain(LifeDomain::parse(value.as_str()?)?),
        "description" => ActivityChange::Description(non_empty(value.as_str()?)?),
        _ => return None,
    };
    Some(change)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_task_create_full_payload() {
        let value = json!({
            "type": "task_create",
            "data": {
                "title": "finish college application",
                "due_date": "2025-06-03",
                "due_time": "15:00",
                "important": true
            }
        });

        let intent = Intent::from_classifier_value(&value);
        assert_eq!(
            intent,
            Intent::TaskCreate {
                title: "finish college application".to_string(),
                due_date: NaiveDate::from_ymd_opt(2025, 6, 3),
                due_time: chrono::NaiveTime::from_hms_opt(15, 0, 0),
                important: true,
            }
        );
    }

    #[test]
    fn test_task_create_missing_title_is_unknown() {
        let value = json!({ "type": "task_create", "data": { "due_date": "2025-06-03" } });
        assert_eq!(Intent::from_classifier_value(&value), Intent::Unknown);
    }

    #[test]
    fn test_task_create_garbled_date_is_unknown() {
        let value = json!({
            "type": "task_create",
            "data": { "title": "essay", "due_date": "next friday" }
        });
        assert_eq!(Intent::from_classifier_value(&value), Intent::Unknown);
    }

    #[test]
    fn test_task_complete_unrecognized_domain_becomes_none() {
        let value = json!({
            "type": "task_complete",
            "data": { "task_identifier": "science homework", "domain": "chores" }
        });
        assert_eq!(
            Intent::from_classifier_value(&value),
            Intent::TaskComplete {
                task_identifier: "science homework".to_string(),
                domain: None,
            }
        );
    }

    #[test]
    fn test_task_edit_important_accepts_string_boolean() {
        let value = json!({
            "type": "task_edit",
            "data": { "task_identifier": "essay", "field": "important", "new_value": "true" }
        });
        assert_eq!(
            Intent::from_classifier_value(&value),
            Intent::TaskEdit {
                task_identifier: "essay".to_string(),
                change: TaskChange::Important(true),
            }
        );
    }

    #[test]
    fn test_task_edit_null_due_date_clears_it() {
        let value = json!({
            "type": "task_edit",
            "data": { "task_identifier": "gym", "field": "due_date", "new_value": null }
        });
        assert_eq!(
            Intent::from_classifier_value(&value),
            Intent::TaskEdit {
                task_identifier: "gym".to_string(),
                change: TaskChange::DueDate(None),
            }
        );
    }

    #[test]
    fn test_task_edit_unknown_field_is_unknown() {
        let value = json!({
            "type": "task_edit",
            "data": { "task_identifier": "essay", "field": "priority", "new_value": "high" }
        });
        assert_eq!(Intent::from_classifier_value(&value), Intent::Unknown);
    }

    #[test]
    fn test_delete_all_scope_defaults_to_today() {
        let value = json!({ "type": "task_delete_all", "data": {} });
        assert_eq!(
            Intent::from_classifier_value(&value),
            Intent::TaskDeleteAll { scope: DeleteScope::Today }
        );
    }

    #[test]
    fn test_query_timeframe_defaults_to_all() {
        let value = json!({ "type": "task_query", "data": {} });
        assert_eq!(
            Intent::from_classifier_value(&value),
            Intent::TaskQuery { timeframe: QueryTimeframe::All }
        );
    }

    #[test]
    fn test_activity_log_requires_a_known_domain() {
        let value = json!({
            "type": "activity_log",
            "data": { "domain": "work", "duration_minutes": 120, "description": "deep work" }
        });
        assert_eq!(Intent::from_classifier_value(&value), Intent::Unknown);
    }

    #[test]
    fn test_activity_log_duration_may_be_absent() {
        let value = json!({
            "type": "activity_log",
            "data": {
                "domain": "learning",
                "duration_minutes": null,
                "description": "reading",
                "end_time": "17:00",
                "is_relative_to_last": false
            }
        });
        assert_eq!(
            Intent::from_classifier_value(&value),
            Intent::ActivityLog {
                domain: LifeDomain::Learning,
                duration_minutes: None,
                description: "reading".to_string(),
                end_time: chrono::NaiveTime::from_hms_opt(17, 0, 0),
                relative_to_last: false,
            }
        );
    }

    #[test]
    fn test_activity_log_nonpositive_duration_is_unknown() {
        let value = json!({
            "type": "activity_log",
            "data": { "domain": "fitness", "duration_minutes": 0, "description": "boxing" }
        });
        assert_eq!(Intent::from_classifier_value(&value), Intent::Unknown);
    }

    #[test]
    fn test_activity_target_last_keyword() {
        let value = json!({
            "type": "activity_delete",
            "data": { "target_description": "last" }
        });
        assert_eq!(
            Intent::from_classifier_value(&value),
            Intent::ActivityDelete { target: ActivityTarget::Last }
        );

        let value = json!({
            "type": "activity_delete",
            "data": { "target_description": "boxing" }
        });
        assert_eq!(
            Intent::from_classifier_value(&value),
            Intent::ActivityDelete { target: ActivityTarget::Matching("boxing".to_string()) }
        );
    }

    #[test]
    fn test_missing_or_unrecognized_type_is_unknown() {
        assert_eq!(Intent::from_classifier_value(&json!({})), Intent::Unknown);
        assert_eq!(
            Intent::from_classifier_value(&json!({ "type": "make_coffee", "data": {} })),
            Intent::Unknown
        );
        assert_eq!(Intent::from_classifier_value(&json!({ "type": 7 })), Intent::Unknown);
    }

    #[test]
    fn test_unit_intents_ignore_data() {
        assert_eq!(Intent::from_classifier_value(&json!({ "type": "status" })), Intent::Status);
        assert_eq!(Intent::from_classifier_value(&json!({ "type": "help" })), Intent::Help);
        assert_eq!(
            Intent::from_classifier_value(&json!({ "type": "summary_request", "data": {} })),
            Intent::SummaryRequest
        );
    }
}
