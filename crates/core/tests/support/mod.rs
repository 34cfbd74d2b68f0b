//! Shared test helpers for `daybook-core` integration tests.
//!
//! In-memory mocks for every dispatcher port, so flow tests can drive whole
//! conversations without a database or a live classifier.

pub mod classify;
pub mod repositories;
