//! Task and activity persistence

pub mod ports;

pub use ports::*;
