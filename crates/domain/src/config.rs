//! Configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BULK_PARALLELISM, DEFAULT_TOKEN_REFRESH_MARGIN_SECS};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub scheduling: SchedulingConfig,
}

/// SQLite database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path.
    pub path: String,
    /// Connection pool size.
    pub pool_size: u32,
}

/// External meeting provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the meeting REST API.
    pub api_base_url: String,
    /// Base URL of the OAuth token endpoint.
    pub auth_base_url: String,
    /// Account identifier for the client-credentials exchange.
    pub account_id: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Refresh cached tokens this many seconds before expiry.
    #[serde(default = "default_token_refresh_margin")]
    pub token_refresh_margin_secs: i64,
}

/// Scheduling engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// IANA name of the fixed reference timezone class times are defined in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Maximum number of occurrences synchronized concurrently in a bulk
    /// call.
    #[serde(default = "default_bulk_parallelism")]
    pub bulk_parallelism: usize,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self { timezone: default_timezone(), bulk_parallelism: default_bulk_parallelism() }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_bulk_parallelism() -> usize {
    DEFAULT_BULK_PARALLELISM
}

fn default_token_refresh_margin() -> i64 {
    DEFAULT_TOKEN_REFRESH_MARGIN_SECS
}
