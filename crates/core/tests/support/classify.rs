//! Scripted classifier and recap mocks for dispatcher tests

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use daybook_core::classify::ports::{IntentClassifier, RecapContext, RecapWriter};
use daybook_domain::{Classification, Intent, Result as DomainResult};
use parking_lot::Mutex;
use serde_json::Value;

/// Classifier that replays a fixed script of intents.
///
/// Each call pops the next scripted intent; an exhausted script yields
/// `Unknown`. Inbound messages are recorded so tests can assert whether a
/// turn reached the classifier at all.
#[derive(Default, Clone)]
pub struct ScriptedClassifier {
    script: Arc<Mutex<VecDeque<Intent>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next intent to return.
    pub fn push(&self, intent: Intent) {
        self.script.lock().push_back(intent);
    }

    /// Messages that reached the classifier, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn classify(
        &self,
        message: &str,
        _local_date: NaiveDate,
        _day_name: &str,
    ) -> DomainResult<Classification> {
        self.calls.lock().push(message.to_string());
        let intent = self.script.lock().pop_front().unwrap_or(Intent::Unknown);
        Ok(Classification { intent, raw: Value::Null })
    }
}

/// Recap writer that returns a canned summary and captures its input.
#[derive(Clone)]
pub struct FixedRecapWriter {
    reply: String,
    contexts: Arc<Mutex<Vec<RecapContext>>>,
}

impl FixedRecapWriter {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), contexts: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Contexts the dispatcher asked to summarize, in order.
    pub fn contexts(&self) -> Vec<RecapContext> {
        self.contexts.lock().clone()
    }
}

#[async_trait]
impl RecapWriter for FixedRecapWriter {
    async fn daily_recap(&self, context: &RecapContext) -> DomainResult<String> {
        self.contexts.lock().push(context.clone());
        Ok(self.reply.clone())
    }
}
