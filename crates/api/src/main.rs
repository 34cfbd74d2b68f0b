//! Daybook server binary - composition root
//!
//! 1. Load configuration (environment first, file fallback)
//! 2. Open the SQLite pool and run migrations
//! 3. Build the Anthropic and Telnyx clients
//! 4. Wire the dispatcher and start the axum server

use std::sync::Arc;

use anyhow::Context;
use daybook_api::routes;
use daybook_api::state::AppState;
use daybook_core::{CommandDispatcher, SessionStore, SystemClock, TemporalResolver};
use daybook_infra::anthropic::AnthropicClient;
use daybook_infra::telnyx::TelnyxClient;
use daybook_infra::{config, DbManager, HttpClient, SqliteActivityRepository, SqliteTaskRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env before config: the loader reads the environment first.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Daybook v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load().context("failed to load configuration")?;

    let db = Arc::new(
        DbManager::new(&config.database.path, config.database.pool_size)
            .context("failed to open database")?,
    );
    db.run_migrations().context("failed to run migrations")?;

    let http = HttpClient::new().context("failed to build http client")?;

    let anthropic = Arc::new(
        AnthropicClient::new(config.classifier.api_key.clone(), http.clone())
            .with_model(config.classifier.model.clone())
            .with_recap_model(config.classifier.recap_model.clone()),
    );

    let messenger = config.messaging.as_ref().map(|messaging| {
        Arc::new(TelnyxClient::new(
            messaging.api_key.clone(),
            messaging.from_number.clone(),
            http.clone(),
        ))
    });
    if messenger.is_none() {
        tracing::warn!("messaging not configured; webhook replies will not be delivered");
    }

    let clock = Arc::new(SystemClock);
    let sessions = Arc::new(SessionStore::new(clock.clone()));
    let temporal = TemporalResolver::new(clock);

    let tasks = Arc::new(SqliteTaskRepository::new(db.clone()));
    let activities = Arc::new(SqliteActivityRepository::new(db.clone()));

    let dispatcher = Arc::new(CommandDispatcher::new(
        anthropic.clone(),
        anthropic,
        tasks,
        activities,
        sessions,
        temporal,
    ));

    let state = AppState::new(dispatcher, db, messenger);
    routes::start_server(&config, state).await?;

    Ok(())
}
