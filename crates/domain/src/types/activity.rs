//! Logged activity records and the life-domain taxonomy

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed set of life domains an activity is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeDomain {
    School,
    Internship,
    PersonalMastery,
    Learning,
    Fitness,
    Social,
    Admin,
    Rest,
}

impl LifeDomain {
    pub const ALL: [Self; 8] = [
        Self::School,
        Self::Internship,
        Self::PersonalMastery,
        Self::Learning,
        Self::Fitness,
        Self::Social,
        Self::Admin,
        Self::Rest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::School => "school",
            Self::Internship => "internship",
            Self::PersonalMastery => "personal_mastery",
            Self::Learning => "learning",
            Self::Fitness => "fitness",
            Self::Social => "social",
            Self::Admin => "admin",
            Self::Rest => "rest",
        }
    }

    /// Parse the snake_case wire name. Unrecognized values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "school" => Some(Self::School),
            "internship" => Some(Self::Internship),
            "personal_mastery" => Some(Self::PersonalMastery),
            "learning" => Some(Self::Learning),
            "fitness" => Some(Self::Fitness),
            "social" => Some(Self::Social),
            "admin" => Some(Self::Admin),
            "rest" => Some(Self::Rest),
            _ => None,
        }
    }
}

impl fmt::Display for LifeDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logged activity
///
/// `created_at` is the instant the activity *ended*; the start is derived by
/// subtracting the duration. Activities on the same local day must not
/// strictly overlap (touching endpoints are fine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub domain: LifeDomain,
    pub duration_minutes: i64,
    pub description: String,
    /// End instant of the activity.
    pub created_at: DateTime<Utc>,
    /// Verbatim message that created the record.
    pub raw_message: String,
}

impl Activity {
    /// Create a new activity with a fresh id, ending at `created_at`.
    pub fn new(
        domain: LifeDomain,
        duration_minutes: i64,
        description: impl Into<String>,
        raw_message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            domain,
            duration_minutes,
            description: description.into(),
            created_at,
            raw_message: raw_message.into(),
        }
    }

    /// Instant the activity began.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.created_at - Duration::minutes(self.duration_minutes)
    }

    /// Instant the activity finished.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.created_at
    }
}
