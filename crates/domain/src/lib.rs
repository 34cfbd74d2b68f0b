//! # Daybook Domain
//!
//! Business domain types and models for Daybook.
//!
//! This crate contains:
//! - Record types (Task, Activity) and the life-domain taxonomy
//! - The typed intent model produced from classifier output
//! - Pending conversation state for multi-turn exchanges
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Daybook crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
