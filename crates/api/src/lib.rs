//! # Daybook API
//!
//! HTTP application layer - axum routes and main entry point.
//!
//! This crate contains:
//! - The Telnyx inbound webhook and the JSON test endpoint
//! - Application state (dependency injection)
//! - Process wiring (config, database, server startup)
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Delivers dispatcher replies back over HTTP / SMS

pub mod handlers;
pub mod routes;
pub mod state;

// Re-export for convenience
pub use routes::create_router;
pub use state::AppState;
