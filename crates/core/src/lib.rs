//! # Daybook Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The command dispatcher and its per-intent handlers
//! - Temporal resolution (day boundary, activity end times, overlap checks)
//! - The per-session pending-state store for multi-turn exchanges
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `daybook-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod classify;
pub mod clock;
pub mod dispatch;
pub mod records;
pub mod session;
pub mod temporal;

// Re-export specific items to avoid ambiguity
pub use classify::ports::{IntentClassifier, RecapContext, RecapWriter};
pub use clock::{Clock, MockClock, SystemClock};
pub use dispatch::{CommandDispatcher, DispatchOutcome};
pub use records::ports::{ActivityRepository, TaskDueFilter, TaskRepository};
pub use session::SessionStore;
pub use temporal::{find_overlap, ResolvedEnd, TemporalResolver, TimingMode};
