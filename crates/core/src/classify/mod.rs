//! Message classification and recap generation

pub mod ports;

pub use ports::*;
