//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Classline
///
/// The variants mirror the failure taxonomy of the scheduling engine:
/// validation failures skip the offending template, auth failures trigger a
/// single forced token refresh, provider failures are retried with backoff
/// before surfacing, and conflicts on meeting creation are resolved as
/// idempotent success by the synchronizer.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ClasslineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Classline operations
pub type Result<T> = std::result::Result<T, ClasslineError>;
