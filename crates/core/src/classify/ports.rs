//! Port interfaces for natural-language understanding

use async_trait::async_trait;
use chrono::NaiveDate;
use daybook_domain::{Activity, Classification, Result};

/// Everything the recap writer needs to summarize a day.
#[derive(Debug, Clone)]
pub struct RecapContext {
    pub local_date: NaiveDate,
    /// The user's reply to the screen-time question, passed through verbatim.
    pub screen_time: String,
    /// Titles of tasks completed today.
    pub completed_tasks: Vec<String>,
    /// Today's activities, oldest first.
    pub activities: Vec<Activity>,
}

/// Trait for turning a free-form message into a structured intent
///
/// Implementations never fail on content they cannot understand; anything
/// unparseable comes back as [`daybook_domain::Intent::Unknown`]. Errors are
/// reserved for transport and protocol failures.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify one inbound message
    ///
    /// `local_date` and `day_name` anchor relative expressions like
    /// "tomorrow" and "Friday".
    async fn classify(
        &self,
        message: &str,
        local_date: NaiveDate,
        day_name: &str,
    ) -> Result<Classification>;
}

/// Trait for composing the end-of-day summary message
#[async_trait]
pub trait RecapWriter: Send + Sync {
    /// Write a short encouraging recap of the day
    async fn daily_recap(&self, context: &RecapContext) -> Result<String>;
}
