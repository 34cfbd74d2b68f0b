//! Domain types and models

pub mod activity;
pub mod intent;
pub mod pending;
pub mod task;

// Re-export record and intent types for convenience
pub use activity::{Activity, LifeDomain};
pub use intent::{
    ActivityChange, ActivityTarget, Classification, DeleteScope, Intent, QueryTimeframe, TaskChange,
};
pub use pending::{PendingEntry, PendingState};
pub use task::{Task, TaskStatus};
