//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CLASSLINE_DB_PATH`: Database file path
//! - `CLASSLINE_DB_POOL_SIZE`: Connection pool size
//! - `CLASSLINE_API_BASE_URL`: Meeting provider REST API base URL
//! - `CLASSLINE_AUTH_BASE_URL`: Meeting provider OAuth base URL
//! - `CLASSLINE_ACCOUNT_ID`: Provider account id
//! - `CLASSLINE_CLIENT_ID`: Provider OAuth client id
//! - `CLASSLINE_CLIENT_SECRET`: Provider OAuth client secret
//! - `CLASSLINE_TOKEN_REFRESH_MARGIN`: Seconds before expiry to refresh
//!   tokens (optional)
//! - `CLASSLINE_TIMEZONE`: IANA reference timezone (optional, default UTC)
//! - `CLASSLINE_BULK_PARALLELISM`: Bulk sync concurrency (optional)
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `classline.{json,toml}` in
//! the working directory, up to two parent directories, and next to the
//! executable.

use std::path::{Path, PathBuf};

use classline_domain::constants::{DEFAULT_BULK_PARALLELISM, DEFAULT_TOKEN_REFRESH_MARGIN_SECS};
use classline_domain::{
    ClasslineError, Config, DatabaseConfig, ProviderConfig, Result, SchedulingConfig,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ClasslineError::Config` if neither source yields a complete
/// configuration.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "environment incomplete, trying config file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// All required variables must be present; optional ones fall back to the
/// defaults documented on the config types.
///
/// # Errors
/// Returns `ClasslineError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("CLASSLINE_DB_PATH")?;
    let db_pool_size = env_var("CLASSLINE_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>()
            .map_err(|e| ClasslineError::Config(format!("invalid pool size: {e}")))
    })?;

    let api_base_url = env_var("CLASSLINE_API_BASE_URL")?;
    let auth_base_url = env_var("CLASSLINE_AUTH_BASE_URL")?;
    let account_id = env_var("CLASSLINE_ACCOUNT_ID")?;
    let client_id = env_var("CLASSLINE_CLIENT_ID")?;
    let client_secret = env_var("CLASSLINE_CLIENT_SECRET")?;

    let token_refresh_margin_secs = match std::env::var("CLASSLINE_TOKEN_REFRESH_MARGIN") {
        Ok(s) => s
            .parse::<i64>()
            .map_err(|e| ClasslineError::Config(format!("invalid token refresh margin: {e}")))?,
        Err(_) => DEFAULT_TOKEN_REFRESH_MARGIN_SECS,
    };

    let timezone =
        std::env::var("CLASSLINE_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
    let bulk_parallelism = match std::env::var("CLASSLINE_BULK_PARALLELISM") {
        Ok(s) => s
            .parse::<usize>()
            .map_err(|e| ClasslineError::Config(format!("invalid bulk parallelism: {e}")))?,
        Err(_) => DEFAULT_BULK_PARALLELISM,
    };

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        provider: ProviderConfig {
            api_base_url,
            auth_base_url,
            account_id,
            client_id,
            client_secret,
            token_refresh_margin_secs,
        },
        scheduling: SchedulingConfig { timezone, bulk_parallelism },
    })
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations. Format is detected
/// by file extension.
///
/// # Errors
/// Returns `ClasslineError::Config` if no file is found or it fails to
/// parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ClasslineError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ClasslineError::Config("no config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ClasslineError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ClasslineError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ClasslineError::Config(format!("invalid JSON format: {e}"))),
        _ => Err(ClasslineError::Config(format!("unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let names = ["config.json", "config.toml", "classline.json", "classline.toml"];
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for dir in [cwd.clone(), cwd.join(".."), cwd.join("../..")] {
            candidates.extend(names.iter().map(|n| dir.join(n)));
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(names.iter().map(|n| exe_dir.join(n)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| ClasslineError::Config(format!("missing required environment variable: {key}")))
}
