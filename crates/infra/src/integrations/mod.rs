//! External service integrations

pub mod anthropic;

pub mod telnyx;
