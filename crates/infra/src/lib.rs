//! # Classline Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite implementations of the repository ports
//! - The HTTP client with retry/backoff
//! - The meeting provider client and its token-lease cache
//! - The configuration loader and engine bootstrap
//!
//! ## Architecture
//! - Implements traits defined in `classline-core`
//! - Depends on `classline-domain` and `classline-core`
//! - Contains all "impure" code (I/O, network)

pub mod bootstrap;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod provider;

// Re-export commonly used items
pub use bootstrap::App;
pub use database::{
    DbManager, SqliteAutomationLog, SqliteMeetingRepository, SqliteOccurrenceRepository,
    SqliteTemplateRepository,
};
pub use errors::InfraError;
pub use http::HttpClient;
pub use provider::{MeetingApiClient, TokenCache};
