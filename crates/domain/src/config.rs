//! Application configuration structures
//!
//! Loaded by the infra config loader from environment variables or a
//! `config.toml`/`config.json` file.

use serde::{Deserialize, Serialize};

use crate::constants::{CLASSIFIER_MODEL, RECAP_MODEL};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaybookConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub classifier: ClassifierConfig,
    /// Outbound SMS delivery. Absent means delivery is disabled and only the
    /// JSON test endpoint is usable.
    #[serde(default)]
    pub messaging: Option<MessagingConfig>,
}

/// HTTP server bind settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// SQLite database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Anthropic messages API settings for classification and recap generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub api_key: String,
    #[serde(default = "default_classifier_model")]
    pub model: String,
    #[serde(default = "default_recap_model")]
    pub recap_model: String,
}

/// Telnyx outbound messaging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    pub api_key: String,
    pub from_number: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_pool_size() -> u32 {
    4
}

fn default_classifier_model() -> String {
    CLASSIFIER_MODEL.to_string()
}

fn default_recap_model() -> String {
    RECAP_MODEL.to_string()
}
