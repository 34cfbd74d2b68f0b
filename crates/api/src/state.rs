//! Application state shared across route handlers
//!
//! Holds the dispatcher plus everything delivery and health need. Handlers
//! receive it through axum's `State` extractor.

use std::sync::Arc;

use daybook_core::CommandDispatcher;
use daybook_infra::telnyx::TelnyxClient;
use daybook_infra::DbManager;

/// Shared application state
///
/// All fields are `Arc`s, so the per-request clone is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Routes each inbound message to its handler and produces the reply.
    pub dispatcher: Arc<CommandDispatcher>,
    /// SQLite pool, probed by the health endpoint.
    pub db: Arc<DbManager>,
    /// Outbound SMS delivery. `None` means replies are returned over HTTP
    /// only, which is how the JSON test endpoint is used standalone.
    pub messenger: Option<Arc<TelnyxClient>>,
}

impl AppState {
    /// Create a new `AppState` with the given components.
    pub fn new(
        dispatcher: Arc<CommandDispatcher>,
        db: Arc<DbManager>,
        messenger: Option<Arc<TelnyxClient>>,
    ) -> Self {
        Self { dispatcher, db, messenger }
    }
}
