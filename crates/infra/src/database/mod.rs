//! Database implementations

pub mod activity_repository;
pub mod manager;
pub mod task_repository;

pub use activity_repository::*;
pub use manager::*;
pub use task_repository::*;
