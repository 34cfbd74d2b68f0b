//! Message dispatch - core business logic
//!
//! Every inbound message takes one of two paths. If the session has pending
//! state, the message answers the open question and is consumed by that
//! handler directly, with no classifier round-trip. Otherwise the message is
//! classified and routed to exactly one handler per command type.
//!
//! Handlers reply in-band for everything the user can act on: unmatched
//! records, rejected overlaps, and failed writes all come back as normal
//! replies. Errors propagate only when nothing sensible can be said, and the
//! HTTP layer turns those into a generic failure response.

mod parse;

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use daybook_domain::constants::DEFAULT_ACTIVITY_MINUTES;
use daybook_domain::{
    Activity, ActivityChange, ActivityTarget, Classification, DeleteScope, Intent, LifeDomain,
    PendingState, QueryTimeframe, Result, Task, TaskChange,
};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::classify::ports::{IntentClassifier, RecapContext, RecapWriter};
use crate::records::ports::{ActivityRepository, TaskDueFilter, TaskRepository};
use crate::session::SessionStore;
use crate::temporal::{find_overlap, TemporalResolver, TimingMode};

/// Reply for a message the classifier could not map to any command.
const UNKNOWN_REPLY: &str = "Didn't catch that. Try \"help\" for commands.";

const HELP_REPLY: &str = r#"Commands:
- Log activity: "2hr reading", "45min gym"
- Add task: "essay due Friday", "meeting 3pm tomorrow"
- Complete task: "done with essay", "finished gym"
- Edit task: "move meeting to 4pm", "make essay important"
- Delete task: "cancel meeting", "remove essay"
- Check tasks: "what's left today?", "this week's tasks"
- Delete activity: "remove last activity", "delete gym log"
- Status: "status", "where am I at?"
- Summary: "summary""#;

/// What one inbound message produced.
///
/// Turns that answer a pending question skip classification, so
/// `classification` is `None` for them.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub reply: String,
    pub classification: Option<Classification>,
}

/// Routes each inbound message to the single handler for its command
pub struct CommandDispatcher {
    classifier: Arc<dyn IntentClassifier>,
    recap: Arc<dyn RecapWriter>,
    tasks: Arc<dyn TaskRepository>,
    activities: Arc<dyn ActivityRepository>,
    sessions: Arc<SessionStore>,
    temporal: TemporalResolver,
}

impl CommandDispatcher {
    /// Create a new dispatcher
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        recap: Arc<dyn RecapWriter>,
        tasks: Arc<dyn TaskRepository>,
        activities: Arc<dyn ActivityRepository>,
        sessions: Arc<SessionStore>,
        temporal: TemporalResolver,
    ) -> Self {
        Self { classifier, recap, tasks, activities, sessions, temporal }
    }

    /// Handle one inbound message for a session and produce the reply
    pub async fn handle_message(&self, session_key: &str, message: &str) -> Result<DispatchOutcome> {
        self.sessions.sweep_expired();

        if let Some(pending) = self.sessions.take(session_key) {
            debug!(session = session_key, "completing pending follow-up");
            let reply = self.complete_pending(pending, message).await?;
            return Ok(DispatchOutcome { reply, classification: None });
        }

        let classification = self
            .classifier
            .classify(message, self.temporal.local_date(), &self.temporal.day_name())
            .await?;
        info!(session = session_key, intent = classification.intent.kind(), "message classified");

        let reply = self.run_intent(session_key, &classification.intent, message).await?;
        Ok(DispatchOutcome { reply, classification: Some(classification) })
    }

    /// Finish the exchange the pending state left open.
    ///
    /// The entry was already consumed, so even a "no" or an unparseable
    /// answer closes the exchange.
    async fn complete_pending(&self, pending: PendingState, message: &str) -> Result<String> {
        match pending {
            PendingState::ConfirmDeleteTasks { scope } => {
                self.confirm_delete_tasks(scope, message).await
            }
            PendingState::ConfirmDeleteActivities { scope } => {
                self.confirm_delete_activities(scope, message).await
            }
            PendingState::AwaitingDuration { task_id, task_title, domain } => {
                self.log_task_duration(task_id, task_title, domain, message).await
            }
            PendingState::AwaitingScreenTime => self.write_daily_recap(message).await,
        }
    }

    async fn run_intent(
        &self,
        session_key: &str,
        intent: &Intent,
        raw_message: &str,
    ) -> Result<String> {
        match intent {
            Intent::TaskCreate { title, due_date, due_time, important } => {
                self.create_task(title, *due_date, *due_time, *important, raw_message).await
            }
            Intent::TaskComplete { task_identifier, domain } => {
                self.complete_task(session_key, task_identifier, *domain).await
            }
            Intent::TaskEdit { task_identifier, change } => {
                self.edit_task(task_identifier, change).await
            }
            Intent::TaskDelete { task_identifier } => self.delete_task(task_identifier).await,
            Intent::TaskDeleteAll { scope } => {
                Ok(self.request_delete_all_tasks(session_key, *scope))
            }
            Intent::TaskQuery { timeframe } => self.query_tasks(*timeframe).await,
            Intent::ActivityLog { domain, duration_minutes, description, end_time, relative_to_last } => {
                self.log_activity(
                    *domain,
                    *duration_minutes,
                    description,
                    *end_time,
                    *relative_to_last,
                    raw_message,
                )
                .await
            }
            Intent::ActivityEdit { target, change } => self.edit_activity(target, change).await,
            Intent::ActivityDelete { target } => self.delete_activity(target).await,
            Intent::ActivityDeleteAll { scope } => {
                Ok(self.request_delete_all_activities(session_key, *scope))
            }
            Intent::SummaryRequest => Ok(self.request_summary(session_key)),
            Intent::Status => self.report_status().await,
            Intent::Help => Ok(HELP_REPLY.to_string()),
            Intent::Unknown => Ok(UNKNOWN_REPLY.to_string()),
        }
    }

    // ============ PENDING FOLLOW-UPS ============

    async fn confirm_delete_tasks(&self, scope: DeleteScope, message: &str) -> Result<String> {
        if !parse::is_affirmative(message) {
            return Ok("Cancelled. No tasks were deleted.".to_string());
        }
        let filter = match scope {
            DeleteScope::Today => TaskDueFilter::On(self.temporal.local_date()),
            DeleteScope::ThisWeek => TaskDueFilter::Through(self.temporal.end_of_week()),
            DeleteScope::All => TaskDueFilter::Any,
        };
        match self.tasks.remove_due(filter).await {
            Ok(()) => Ok(format!("All tasks {}deleted.", scope_phrase(scope))),
            Err(err) => {
                error!(error = %err, "failed to delete tasks");
                Ok("Failed to delete tasks. Try again.".to_string())
            }
        }
    }

    async fn confirm_delete_activities(&self, scope: DeleteScope, message: &str) -> Result<String> {
        if !parse::is_affirmative(message) {
            return Ok("Cancelled. No activities were deleted.".to_string());
        }
        // Anything broader than today clears the whole history.
        let outcome = match scope {
            DeleteScope::Today => self.activities.remove_since(self.temporal.start_of_today()).await,
            DeleteScope::ThisWeek | DeleteScope::All => self.activities.remove_all().await,
        };
        match outcome {
            Ok(()) => Ok(format!("All activities {}deleted.", scope_phrase(scope))),
            Err(err) => {
                error!(error = %err, "failed to delete activities");
                Ok("Failed to delete activities. Try again.".to_string())
            }
        }
    }

    /// The reply to "How long did it take?" after completing a task.
    ///
    /// Logs the time against the completed task's title, deliberately
    /// skipping the overlap check: the task is already marked done, so the
    /// log must not be turned away.
    async fn log_task_duration(
        &self,
        task_id: Uuid,
        task_title: String,
        domain: LifeDomain,
        message: &str,
    ) -> Result<String> {
        let minutes = parse::parse_duration_reply(message);
        debug!(task_id = %task_id, minutes, "logging duration for completed task");

        let activity = Activity::new(domain, minutes, task_title, message, self.temporal.now());
        match self.activities.insert(&activity).await {
            Ok(()) => Ok(format!("Logged {minutes}min {domain}. Nice work.")),
            Err(err) => {
                error!(error = %err, "failed to log completion activity");
                Ok("Task completed but failed to log activity.".to_string())
            }
        }
    }

    /// The reply to "What was your screen time today?".
    async fn write_daily_recap(&self, screen_time: &str) -> Result<String> {
        let start = self.temporal.start_of_today();
        let completed = self.tasks.completed_since(start).await?;
        let activities = self.activities.list_since(start).await?;

        let context = RecapContext {
            local_date: self.temporal.local_date(),
            screen_time: screen_time.to_string(),
            completed_tasks: completed.into_iter().map(|task| task.title).collect(),
            activities,
        };
        self.recap.daily_recap(&context).await
    }

    // ============ TASK COMMANDS ============

    async fn create_task(
        &self,
        title: &str,
        due_date: Option<NaiveDate>,
        due_time: Option<NaiveTime>,
        important: bool,
        raw_message: &str,
    ) -> Result<String> {
        let task = Task::new(title, due_date, due_time, important, raw_message, self.temporal.now());
        match self.tasks.insert(&task).await {
            Ok(()) => {
                let mut reply = format!("Added: {title}");
                if let Some(date) = due_date {
                    reply.push_str(&format!(" ({date})"));
                }
                if let Some(time) = due_time {
                    reply.push_str(&format!(" at {}", time.format("%H:%M")));
                }
                if important {
                    reply.push_str(" [!]");
                }
                Ok(reply)
            }
            Err(err) => {
                error!(error = %err, "failed to save task");
                Ok("Failed to save task. Try again.".to_string())
            }
        }
    }

    async fn complete_task(
        &self,
        session_key: &str,
        task_identifier: &str,
        domain: Option<LifeDomain>,
    ) -> Result<String> {
        let Some(task) = self.tasks.find_open_matching(task_identifier).await? else {
            return Ok(format!("No open task matching \"{task_identifier}\". Check spelling?"));
        };
        self.tasks.set_completed(task.id, self.temporal.now()).await?;

        self.sessions.set(
            session_key,
            PendingState::AwaitingDuration {
                task_id: task.id,
                task_title: task.title.clone(),
                domain: domain.unwrap_or(LifeDomain::Admin),
            },
        );
        Ok(format!("✓ Completed: {}. How long did it take?", task.title))
    }

    async fn edit_task(&self, task_identifier: &str, change: &TaskChange) -> Result<String> {
        let Some(task) = self.tasks.find_open_matching(task_identifier).await? else {
            return Ok(format!("No open task matching \"{task_identifier}\"."));
        };
        match self.tasks.apply_change(task.id, change).await {
            Ok(()) => Ok(format!(
                "Updated \"{}\": {} → {}",
                task.title,
                change.field_name(),
                change.value_label()
            )),
            Err(err) => {
                error!(error = %err, "failed to update task");
                Ok("Failed to update task. Try again.".to_string())
            }
        }
    }

    async fn delete_task(&self, task_identifier: &str) -> Result<String> {
        let Some(task) = self.tasks.find_any_matching(task_identifier).await? else {
            return Ok(format!("No task matching \"{task_identifier}\"."));
        };
        self.tasks.remove(task.id).await?;
        Ok(format!("Deleted: {}", task.title))
    }

    fn request_delete_all_tasks(&self, session_key: &str, scope: DeleteScope) -> String {
        self.sessions.set(session_key, PendingState::ConfirmDeleteTasks { scope });
        let suffix = match scope {
            DeleteScope::All => String::new(),
            other => format!(" for {}", other.as_str()),
        };
        format!("Delete all tasks{suffix}? Reply YES to confirm.")
    }

    async fn query_tasks(&self, timeframe: QueryTimeframe) -> Result<String> {
        let filter = match timeframe {
            QueryTimeframe::Today => TaskDueFilter::On(self.temporal.local_date()),
            QueryTimeframe::Tomorrow => {
                TaskDueFilter::On(self.temporal.local_date() + Duration::days(1))
            }
            QueryTimeframe::ThisWeek => TaskDueFilter::Through(self.temporal.end_of_week()),
            QueryTimeframe::All => TaskDueFilter::Any,
        };
        let tasks = self.tasks.list_open(filter).await?;

        if tasks.is_empty() {
            return Ok(match timeframe {
                QueryTimeframe::Today => "Nothing due today. You're clear.".to_string(),
                QueryTimeframe::All => "No tasks.".to_string(),
                other => format!("No tasks for {}.", other.as_str()),
            });
        }

        let lines: Vec<String> = tasks
            .iter()
            .map(|task| {
                let flag = if task.important { "! " } else { "  " };
                // The date is noise when the query already fixed the day.
                let date = match task.due_date {
                    Some(date) if timeframe != QueryTimeframe::Today => format!(" ({date})"),
                    _ => String::new(),
                };
                let time = task
                    .due_time
                    .map(|time| format!(" {}", time.format("%H:%M")))
                    .unwrap_or_default();
                format!("{flag}{}{date}{time}", task.title)
            })
            .collect();

        let header = match timeframe {
            QueryTimeframe::All => "Tasks:".to_string(),
            other => format!("Tasks ({}):", other.as_str()),
        };
        Ok(format!("{header}\n{}", lines.join("\n")))
    }

    // ============ ACTIVITY COMMANDS ============

    async fn log_activity(
        &self,
        domain: LifeDomain,
        duration_minutes: Option<i64>,
        description: &str,
        end_time: Option<NaiveTime>,
        relative_to_last: bool,
        raw_message: &str,
    ) -> Result<String> {
        let minutes = duration_minutes.unwrap_or(DEFAULT_ACTIVITY_MINUTES);
        let start_of_today = self.temporal.start_of_today();

        // The previous activity only matters when chaining, and an explicit
        // end time pre-empts chaining.
        let last_today = if relative_to_last && end_time.is_none() {
            self.activities.find_latest_since(start_of_today, None).await?
        } else {
            None
        };
        let resolved =
            self.temporal.resolve_end(minutes, end_time, relative_to_last, last_today.as_ref());

        let existing = self.activities.list_since(start_of_today).await?;
        if let Some(conflict) = find_overlap(resolved.end, minutes, &existing) {
            debug!(conflict = %conflict.description, "activity overlap rejected");
            return Ok(format!(
                "Overlap with \"{}\" ({}m). Delete it first or adjust time.",
                conflict.description, conflict.duration_minutes
            ));
        }

        let activity = Activity::new(domain, minutes, description, raw_message, resolved.end);
        match self.activities.insert(&activity).await {
            Ok(()) => {
                let label = match resolved.mode {
                    TimingMode::Explicit => end_time
                        .map(|time| format!(" at {}", time.format("%H:%M")))
                        .unwrap_or_default(),
                    TimingMode::AfterPrevious => " (after previous)".to_string(),
                    TimingMode::Now => String::new(),
                };
                Ok(format!("Logged: {minutes}min {domain} - {description}{label}"))
            }
            Err(err) => {
                error!(error = %err, "failed to log activity");
                Ok("Failed to log activity.".to_string())
            }
        }
    }

    async fn edit_activity(
        &self,
        target: &ActivityTarget,
        change: &ActivityChange,
    ) -> Result<String> {
        let Some(activity) = self.find_targeted_activity(target).await? else {
            return Ok(format!("No activity matching \"{}\".", target.label()));
        };
        match self.activities.apply_change(activity.id, change).await {
            Ok(()) => Ok(format!(
                "Updated \"{}\": {} → {}",
                activity.description,
                change.field_name(),
                change.value_label()
            )),
            Err(err) => {
                error!(error = %err, "failed to update activity");
                Ok("Failed to update activity.".to_string())
            }
        }
    }

    async fn delete_activity(&self, target: &ActivityTarget) -> Result<String> {
        let Some(activity) = self.find_targeted_activity(target).await? else {
            return Ok(match target {
                ActivityTarget::Last => "No activities to remove.".to_string(),
                ActivityTarget::Matching(needle) => format!("No activity matching \"{needle}\"."),
            });
        };
        self.activities.remove(activity.id).await?;
        Ok(format!("Removed: {}", activity.description))
    }

    /// Resolve an edit/delete target among today's activities.
    async fn find_targeted_activity(&self, target: &ActivityTarget) -> Result<Option<Activity>> {
        let needle = match target {
            ActivityTarget::Last => None,
            ActivityTarget::Matching(needle) => Some(needle.as_str()),
        };
        self.activities.find_latest_since(self.temporal.start_of_today(), needle).await
    }

    fn request_delete_all_activities(&self, session_key: &str, scope: DeleteScope) -> String {
        self.sessions.set(session_key, PendingState::ConfirmDeleteActivities { scope });
        let suffix = if scope == DeleteScope::Today { " for today" } else { "" };
        format!("Delete all activities{suffix}? Reply YES to confirm.")
    }

    // ============ SUMMARY COMMANDS ============

    fn request_summary(&self, session_key: &str) -> String {
        self.sessions.set(session_key, PendingState::AwaitingScreenTime);
        "What was your screen time today?".to_string()
    }

    async fn report_status(&self) -> Result<String> {
        let today = self.temporal.local_date();
        let start = self.temporal.start_of_today();

        let due_today = self.tasks.list_open(TaskDueFilter::On(today)).await?;
        let completed = self.tasks.completed_since(start).await?;
        let activities = self.activities.list_since(start).await?;

        // Totals keyed by first appearance, so the breakdown reads in the
        // order the day unfolded.
        let mut domain_totals: Vec<(LifeDomain, i64)> = Vec::new();
        let mut total_minutes = 0;
        for activity in &activities {
            total_minutes += activity.duration_minutes;
            match domain_totals.iter_mut().find(|(domain, _)| *domain == activity.domain) {
                Some((_, minutes)) => *minutes += activity.duration_minutes,
                None => domain_totals.push((activity.domain, activity.duration_minutes)),
            }
        }

        let time_str = if total_minutes >= 60 {
            format!("{}h {}m", total_minutes / 60, total_minutes % 60)
        } else {
            format!("{total_minutes}m")
        };

        let mut reply = format!(
            "Today: {} done, {} remaining. {time_str} logged.",
            completed.len(),
            due_today.len()
        );
        if !domain_totals.is_empty() {
            let breakdown: Vec<String> = domain_totals
                .iter()
                .map(|(domain, minutes)| format!("{domain}: {minutes}m"))
                .collect();
            reply.push_str(&format!("\n{}", breakdown.join(", ")));
        }
        Ok(reply)
    }
}

/// "for today " / "for this_week " segment of bulk-delete confirmations.
fn scope_phrase(scope: DeleteScope) -> String {
    match scope {
        DeleteScope::All => String::new(),
        other => format!("for {} ", other.as_str()),
    }
}
