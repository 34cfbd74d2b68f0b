//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Conversation state configuration
pub const PENDING_TTL_SECS: u64 = 300;
pub const DEFAULT_SESSION_KEY: &str = "default";

// Activity logging configuration
pub const DEFAULT_ACTIVITY_MINUTES: i64 = 30;

// Calendar anchoring. The sender's local date comes from this timezone; the
// midnight instant is approximated with a fixed offset from UTC (standard
// time), so DST shifts the boundary by an hour.
pub const LOCAL_TIMEZONE: &str = "America/New_York";
pub const LOCAL_MIDNIGHT_UTC_OFFSET_HOURS: i64 = 5;

// Language model defaults
pub const CLASSIFIER_MODEL: &str = "claude-3-haiku-20240307";
pub const CLASSIFIER_MAX_TOKENS: u32 = 1024;
pub const RECAP_MODEL: &str = "claude-sonnet-4-20250514";
pub const RECAP_MAX_TOKENS: u32 = 300;
