//! SQLite persistence layer.
//!
//! [`DbManager`] owns the connection pool and schema migrations; the
//! repository types implement the core persistence ports on top of it.

mod automation_log_repository;
mod manager;
mod meeting_repository;
mod occurrence_repository;
mod template_repository;

pub use automation_log_repository::SqliteAutomationLog;
pub use manager::DbManager;
pub use meeting_repository::SqliteMeetingRepository;
pub use occurrence_repository::SqliteOccurrenceRepository;
pub use template_repository::SqliteTemplateRepository;

use rusqlite::types::Type;
use uuid::Uuid;

/// Parse a TEXT uuid column, reporting a conversion failure rusqlite can
/// attribute to the right column.
pub(crate) fn uuid_column(idx: usize, value: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

/// Parse an optional TEXT uuid column.
pub(crate) fn uuid_column_opt(idx: usize, value: Option<String>) -> rusqlite::Result<Option<Uuid>> {
    value.map(|v| uuid_column(idx, v)).transpose()
}
