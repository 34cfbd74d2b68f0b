//! # Daybook Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite-backed task and activity repositories
//! - HTTP client with retry support
//! - External service integrations (Anthropic, Telnyx)
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `daybook-core`
//! - Depends on `daybook-domain` and `daybook-core`
//! - Contains all "impure" code (I/O, external APIs)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;

// Re-export commonly used items
pub use database::*;
pub use http::*;
pub use integrations::*;
