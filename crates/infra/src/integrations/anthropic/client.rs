/// Anthropic Messages API client for intent classification and daily recaps
use async_trait::async_trait;
use chrono::NaiveDate;
use daybook_core::{IntentClassifier, RecapContext, RecapWriter};
use daybook_domain::constants::{
    CLASSIFIER_MAX_TOKENS, CLASSIFIER_MODEL, RECAP_MAX_TOKENS, RECAP_MODEL,
};
use daybook_domain::{Classification, DaybookError, Result as DomainResult};
use reqwest::Method;
use tracing::debug;

use crate::http::HttpClient;

use super::types::{AnthropicError, MessageParam, MessagesRequest, MessagesResponse};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Reply used when the recap model answers with something other than text.
const RECAP_FALLBACK: &str = "Day recorded!";

/// Anthropic Messages API client
///
/// Backs both language-model ports: `IntentClassifier` for parsing inbound
/// messages and `RecapWriter` for the end-of-day summary. The two use cases
/// run on different models.
pub struct AnthropicClient {
    http_client: HttpClient,
    api_key: String,
    model: String,
    recap_model: String,
    api_url: String,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API key (required)
    /// * `http_client` - HTTP client with retry logic
    pub fn new(api_key: String, http_client: HttpClient) -> Self {
        Self {
            http_client,
            api_key,
            model: CLASSIFIER_MODEL.to_string(),
            recap_model: RECAP_MODEL.to_string(),
            api_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Override the classification model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the recap model
    pub fn with_recap_model(mut self, model: impl Into<String>) -> Self {
        self.recap_model = model.into();
        self
    }

    /// Create a new client with custom API URL (for testing)
    #[cfg(test)]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Call the Messages API
    async fn call_api(&self, request: &MessagesRequest) -> Result<MessagesResponse, AnthropicError> {
        let request_builder = self
            .http_client
            .request(Method::POST, format!("{}/v1/messages", self.api_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(request);

        // Execute with retry (handled by HttpClient)
        let response = self.http_client.send(request_builder).await.map_err(|err| match err {
            DaybookError::Network(msg) => AnthropicError::Network(msg),
            DaybookError::Internal(msg) => AnthropicError::Network(msg),
            other => AnthropicError::Network(format!("HTTP error: {other}")),
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), model = %request.model, "Received Anthropic API response");

        if !status.is_success() {
            return Err(self.handle_error_status(status.as_u16(), response).await);
        }

        response
            .json::<MessagesResponse>()
            .await
            .map_err(|e| AnthropicError::InvalidSchema(format!("Failed to parse response: {e}")))
    }

    /// Handle HTTP error status codes
    async fn handle_error_status(&self, status: u16, response: reqwest::Response) -> AnthropicError {
        let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        match status {
            401 | 403 => AnthropicError::Authentication(format!("Invalid API key ({status})")),
            _ => AnthropicError::Api { status, message },
        }
    }
}

#[async_trait]
impl IntentClassifier for AnthropicClient {
    async fn classify(
        &self,
        message: &str,
        local_date: NaiveDate,
        day_name: &str,
    ) -> DomainResult<Classification> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: CLASSIFIER_MAX_TOKENS,
            messages: vec![MessageParam {
                role: "user".to_string(),
                content: build_classifier_prompt(message, local_date, day_name),
            }],
        };

        let response = self.call_api(&request).await.map_err(classifier_error)?;

        let Some(text) = response.first_text() else {
            debug!("classifier returned a non-text completion");
            return Ok(Classification::unknown());
        };

        Ok(parse_classification(text))
    }
}

#[async_trait]
impl RecapWriter for AnthropicClient {
    async fn daily_recap(&self, context: &RecapContext) -> DomainResult<String> {
        let request = MessagesRequest {
            model: self.recap_model.clone(),
            max_tokens: RECAP_MAX_TOKENS,
            messages: vec![MessageParam {
                role: "user".to_string(),
                content: build_recap_prompt(context),
            }],
        };

        let response = self.call_api(&request).await.map_err(classifier_error)?;

        Ok(response.first_text().map_or_else(|| RECAP_FALLBACK.to_string(), str::to_string))
    }
}

fn classifier_error(err: AnthropicError) -> DaybookError {
    DaybookError::Classifier(err.to_string())
}

/// Extract the classification from a completion
///
/// Models occasionally wrap the object in prose, so this parses the span from
/// the first `{` to the last `}` rather than the whole completion. Anything
/// that still fails to parse degrades to the unknown intent.
fn parse_classification(completion: &str) -> Classification {
    let Some(candidate) = json_object_span(completion) else {
        return Classification::unknown();
    };
    match serde_json::from_str(candidate) {
        Ok(raw) => Classification::from_value(raw),
        Err(_) => Classification::unknown(),
    }
}

fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start <= end).then(|| &text[start..=end])
}

fn build_classifier_prompt(message: &str, local_date: NaiveDate, day_name: &str) -> String {
    format!(
        "You are parsing a message from a user to their accountability agent. Analyze the message and extract structured data.\n\nCurrent Date: {date} ({day_name})\n\nMessage: \"{message}\"\n\n{body}",
        date = local_date.format("%Y-%m-%d"),
        body = CLASSIFIER_PROMPT_BODY,
    )
}

const CLASSIFIER_PROMPT_BODY: &str = r#"COMMAND TYPES:

1. task_create
   Use when: User wants to add a new task to complete later. May include a date and/or time.
   Examples: "I need to finish college application by 3pm today", "must finish science homework tomorrow", "add gym to my tasks for this wednesday"
   IMPORTANT: Do NOT use for past activities like "I did x", "finished y", "I sat in bed". Use activity_log for those.

2. task_complete
   Use when: User has finished a scheduled task.
   Examples: "I have just finished my science homework", "cross off my task to talk to 3 new people", "completed my gym workout"

3. task_edit
   Use when: User wants to change details of an existing task.
   Examples: "change my meeting with Grace to 5pm", "make my essay task important", "move gym to tomorrow"

4. task_delete
   Use when: User wants to cancel/remove a task (not complete it, just delete it).
   Examples: "delete my meeting with John", "cancel the dentist appointment", "remove gym from my tasks"

5. task_delete_all
   Use when: User wants to clear all scheduled tasks/to-dos.
   Examples: "delete all my tasks", "clear all tasks for today", "remove everything from my task list", "wipe my to-dos"
   IMPORTANT: "Activities" are logs of past actions. Tasks are future items. If user says "delete activities", "clear logs", "wipe history", use activity_delete_all.
   NEGATIVE EXAMPLES: "clear all activities" -> use activity_delete_all. "remove all logs" -> use activity_delete_all.

6. task_query
   Use when: User wants to see their scheduled tasks.
   Examples: "what's left today?", "what do I have due this week?", "show me my tasks"

7. activity_log
   Use when: User has completed an activity and wants to record time spent.
   Examples: "just did 2hr deep work on my side project", "finished 45min reading", "1hr boxing session", "I sat in bed for 2 hours"

8. activity_edit
   Use when: User wants to change a previously logged activity.
   Examples: "change my last activity to 90 minutes", "that reading was actually fitness", "update boxing to 45min"

9. activity_delete
   Use when: User wants to remove a single logged activity.
   Examples: "delete my last activity", "remove the boxing log", "undo that"

10. activity_delete_all
    Use when: User wants to clear all logged activities/history.
    Examples: "remove all activities", "clear today's logs", "delete all activity logs", "clear all activities", "wipe my history", "delete everything I did today"
    IMPORTANT: This is for PAST logs. Triggers: "activities", "logs", "history", "what I did".
    NEGATIVE EXAMPLES: "delete all tasks" -> use task_delete_all. "clear to-do list" -> use task_delete_all.

11. summary_request
    Use when: User explicitly asks for their daily summary.
    Examples: "summary", "give me my daily summary", "how did I do today?"

12. status
    Use when: User wants a quick snapshot of current progress.
    Examples: "status", "where am I at?", "quick update", "how's my day looking?"

13. help
    Use when: User asks what they can do or how to use the system.
    Examples: "help", "what can I say?", "how does this work?", "commands"

DOMAIN CLASSIFICATION (for activities):
- school: classes, assignments, problem sets, academic work
- internship: professional work, client deliverables, office tasks
- personal_mastery: coding projects, side projects, skill-building, personal projects
- learning: reading, philosophy, courses, research, studying
- fitness: gym, boxing, lacrosse, running, exercise
- social: friends, calls, events, dates, hanging out
- admin: emails, errands, scheduling, logistics, chores
- rest: intentional downtime, naps, recovery, relaxation

Return ONLY a JSON object:

{
  "type": "task_create" | "task_complete" | "task_edit" | "task_delete" | "task_delete_all" | "task_query" | "activity_log" | "activity_edit" | "activity_delete" | "activity_delete_all" | "summary_request" | "status" | "help",
  "data": {
    // For task_create:
    "title": string,
    "due_date": "YYYY-MM-DD" or null,
    "due_time": "HH:MM" (24hr) or null,
    "important": boolean,

    // For task_complete:
    "task_identifier": string (keywords to match task),
    "domain": string (inferred domain for activity logging),

    // For task_edit:
    "task_identifier": string,
    "field": "title" | "due_date" | "due_time" | "important",
    "new_value": string | boolean,

    // For task_delete:
    "task_identifier": string,

    // For task_delete_all:
    "scope": "today" | "this_week" | "all",

    // For task_query:
    "timeframe": "today" | "tomorrow" | "this_week" | "all",

    // For activity_log:
    "domain": string,
    "duration_minutes": number,
    "description": string,
    "end_time": "HH:MM" (24hr) or null, // Extract if user specifies when they finished OR a range (e.g. "at 5pm", "from 10 to 12" -> "12:00"). "noon" = "12:00".
    "is_relative_to_last": boolean, // true if user says "right after that", "after last activity", "then I did...", etc.

    // For activity_edit:
    "target_description": string (keywords or "last"),
    "field": "duration_minutes" | "domain" | "description",
    "new_value": string | number,

    // For activity_delete:
    "target_description": string (keywords or "last"),

    // For activity_delete_all:
    "scope": "today" | "all"
  }
}"#;

fn build_recap_prompt(context: &RecapContext) -> String {
    let completed = if context.completed_tasks.is_empty() {
        "None".to_string()
    } else {
        context.completed_tasks.join(", ")
    };
    let activities = if context.activities.is_empty() {
        "None".to_string()
    } else {
        context
            .activities
            .iter()
            .map(|a| format!("{}m {} ({})", a.duration_minutes, a.domain, a.description))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "You are an accountability assistant. Generate a brief daily summary (max 3 sentences) for the user.\n\nData for today ({date}):\n- User's Screen Time: {screen_time}\n- Completed Tasks: {completed}\n- Logged Activities: {activities}\n\nacknowledge the screen time briefly, highlight 1 key win from their activities/tasks, and give a short encouraging closing remark.",
        date = context.local_date.format("%Y-%m-%d"),
        screen_time = context.screen_time,
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use daybook_domain::{Activity, Intent, LifeDomain};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(api_url: String) -> AnthropicClient {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(5))
            .max_attempts(1) // No retries in tests
            .build()
            .expect("http client");

        AnthropicClient::new("test-api-key".to_string(), http_client).with_api_url(api_url)
    }

    fn text_completion(text: &str) -> serde_json::Value {
        json!({
            "id": "msg_test",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-haiku-20240307",
            "stop_reason": "end_turn",
            "content": [{ "type": "text", "text": text }]
        })
    }

    fn june_3() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 3).expect("valid date")
    }

    #[tokio::test]
    async fn classifies_message_into_typed_intent() {
        let mock_server = MockServer::start().await;

        let completion = r#"{"type":"activity_log","data":{"domain":"fitness","duration_minutes":60,"description":"boxing","end_time":null,"is_relative_to_last":false}}"#;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_completion(completion)))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let classification =
            client.classify("1hr boxing session", june_3(), "Tuesday").await.expect("classify");

        assert_eq!(
            classification.intent,
            Intent::ActivityLog {
                domain: LifeDomain::Fitness,
                duration_minutes: Some(60),
                description: "boxing".to_string(),
                end_time: None,
                relative_to_last: false,
            }
        );
    }

    #[tokio::test]
    async fn prompt_carries_date_day_and_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(text_completion(r#"{"type":"status"}"#)),
            )
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        client.classify("status", june_3(), "Tuesday").await.expect("classify");

        let requests = mock_server.received_requests().await.expect("requests recorded");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");

        assert_eq!(body["model"], CLASSIFIER_MODEL);
        assert_eq!(body["max_tokens"], 1024);
        let prompt = body["messages"][0]["content"].as_str().expect("prompt text");
        assert!(prompt.contains("Current Date: 2025-06-03 (Tuesday)"));
        assert!(prompt.contains("Message: \"status\""));
        assert!(prompt.contains("DOMAIN CLASSIFICATION"));
    }

    #[tokio::test]
    async fn extracts_json_wrapped_in_prose() {
        let mock_server = MockServer::start().await;

        let completion = "Here is the parsed command:\n{\"type\": \"help\", \"data\": {}}\nLet me know if I can help further.";

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_completion(completion)))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let classification = client.classify("help", june_3(), "Tuesday").await.expect("classify");

        assert_eq!(classification.intent, Intent::Help);
    }

    #[tokio::test]
    async fn completion_without_json_degrades_to_unknown() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_completion("Sorry, I could not parse that message.")),
            )
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let classification =
            client.classify("asdfgh", june_3(), "Tuesday").await.expect("classify");

        assert_eq!(classification.intent, Intent::Unknown);
        assert_eq!(classification.raw, json!({ "type": "unknown", "data": {} }));
    }

    #[tokio::test]
    async fn non_text_block_degrades_to_unknown() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "tool_use", "id": "toolu_1", "name": "noop", "input": {} }]
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let classification = client.classify("hello", june_3(), "Tuesday").await.expect("classify");

        assert_eq!(classification.intent, Intent::Unknown);
    }

    #[tokio::test]
    async fn authentication_failure_surfaces_as_classifier_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let result = client.classify("status", june_3(), "Tuesday").await;

        match result {
            Err(DaybookError::Classifier(msg)) => assert!(msg.contains("Authentication")),
            other => panic!("expected classifier error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn recap_returns_model_text_and_formats_day_data() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_completion(
                "Screen time noted. That boxing session was a solid win. Keep the streak going!",
            )))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let end = Utc.with_ymd_and_hms(2025, 6, 3, 21, 0, 0).single().expect("valid instant");
        let context = RecapContext {
            local_date: june_3(),
            screen_time: "3h 12m".to_string(),
            completed_tasks: vec!["essay".to_string()],
            activities: vec![Activity::new(LifeDomain::Fitness, 60, "boxing", "1hr boxing", end)],
        };

        let recap = client.daily_recap(&context).await.expect("recap");
        assert!(recap.starts_with("Screen time noted."));

        let requests = mock_server.received_requests().await.expect("requests recorded");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");

        assert_eq!(body["model"], RECAP_MODEL);
        assert_eq!(body["max_tokens"], 300);
        let prompt = body["messages"][0]["content"].as_str().expect("prompt text");
        assert!(prompt.contains("- User's Screen Time: 3h 12m"));
        assert!(prompt.contains("- Completed Tasks: essay"));
        assert!(prompt.contains("- Logged Activities: 60m fitness (boxing)"));
    }

    #[tokio::test]
    async fn recap_with_empty_day_reports_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_completion("Rest day.")))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let context = RecapContext {
            local_date: june_3(),
            screen_time: "5h".to_string(),
            completed_tasks: vec![],
            activities: vec![],
        };

        client.daily_recap(&context).await.expect("recap");

        let requests = mock_server.received_requests().await.expect("requests recorded");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
        let prompt = body["messages"][0]["content"].as_str().expect("prompt text");
        assert!(prompt.contains("- Completed Tasks: None"));
        assert!(prompt.contains("- Logged Activities: None"));
    }

    #[tokio::test]
    async fn recap_falls_back_when_completion_is_not_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "tool_use", "id": "toolu_1", "name": "noop", "input": {} }]
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let context = RecapContext {
            local_date: june_3(),
            screen_time: "2h".to_string(),
            completed_tasks: vec![],
            activities: vec![],
        };

        let recap = client.daily_recap(&context).await.expect("recap");
        assert_eq!(recap, "Day recorded!");
    }

    #[test]
    fn json_object_span_requires_balanced_braces_order() {
        assert_eq!(json_object_span("{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(json_object_span("prose { \"a\": 1 } trailing"), Some("{ \"a\": 1 }"));
        assert_eq!(json_object_span("no json here"), None);
        assert_eq!(json_object_span("} reversed {"), None);
    }
}
