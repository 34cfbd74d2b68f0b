//! Per-session pending conversation state
//!
//! A session key (the sender's phone number, or "default" for the JSON test
//! endpoint) maps to at most one pending follow-up. Entries expire five
//! minutes after they are set; expiry is enforced lazily on access and by an
//! explicit sweep at the start of each inbound request.
//!
//! State lives in process memory only. A restart forgets every open
//! conversation, which is acceptable for best-effort conversational memory.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use daybook_domain::constants::PENDING_TTL_SECS;
use daybook_domain::{PendingEntry, PendingState};
use parking_lot::Mutex;
use tracing::debug;

use crate::clock::Clock;

/// In-process store of pending conversation state, one entry per session
///
/// All access funnels through one mutex, which makes `take` atomic: two
/// racing messages cannot both consume the same entry.
pub struct SessionStore {
    entries: Mutex<HashMap<String, PendingEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(PENDING_TTL_SECS as i64),
            clock,
        }
    }

    /// Override the TTL. Used by tests.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set (or replace) the pending state for a session.
    pub fn set(&self, session_key: &str, state: PendingState) {
        let entry = PendingEntry { state, created_at: self.clock.now() };
        let mut entries = self.entries.lock();
        if entries.insert(session_key.to_string(), entry).is_some() {
            debug!(session = session_key, "pending state replaced");
        }
    }

    /// Look at the pending state without consuming it.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&self, session_key: &str) -> Option<PendingState> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(session_key) {
            Some(entry) if self.is_expired(entry, now) => {
                entries.remove(session_key);
                None
            }
            Some(entry) => Some(entry.state.clone()),
            None => None,
        }
    }

    /// Atomically remove and return the pending state for a session.
    ///
    /// Expired entries are dropped, never returned.
    pub fn take(&self, session_key: &str) -> Option<PendingState> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let entry = entries.remove(session_key)?;
        if self.is_expired(&entry, now) {
            return None;
        }
        Some(entry.state)
    }

    /// Drop the pending state for a session, if any.
    pub fn clear(&self, session_key: &str) {
        self.entries.lock().remove(session_key);
    }

    /// Remove every entry older than the TTL.
    ///
    /// Called at the start of each inbound request, mirroring the lazy
    /// cleanup model: no background task, but stale sessions never survive
    /// the next message from anyone.
    pub fn sweep_expired(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let swept = before - entries.len();
        if swept > 0 {
            debug!(swept, "expired pending state swept");
        }
    }

    fn is_expired(&self, entry: &PendingEntry, now: DateTime<Utc>) -> bool {
        now - entry.created_at > self.ttl
    }
}
