//! SQLite implementation of the AutomationLog port.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use classline_core::AutomationLog;
use classline_domain::{AutomationLogEntry, LogOutcome, Result};
use rusqlite::types::Type;
use rusqlite::{params, Row};
use tracing::instrument;

use super::{uuid_column, uuid_column_opt, DbManager};
use crate::errors::InfraError;

/// Append-only SQLite audit log.
pub struct SqliteAutomationLog {
    db: Arc<DbManager>,
}

impl SqliteAutomationLog {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Most recent entries, newest first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<AutomationLogEntry>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, kind, outcome, message, details, related_template_id, created_at
                 FROM automation_log
                 ORDER BY created_at DESC, id
                 LIMIT ?1",
            )
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(params![limit as i64], map_log_row)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;
        Ok(rows)
    }
}

fn map_log_row(row: &Row<'_>) -> rusqlite::Result<AutomationLogEntry> {
    let outcome_text: String = row.get(2)?;
    let outcome = LogOutcome::from_str(&outcome_text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(err)))?;

    let details_text: String = row.get(4)?;
    let details = serde_json::from_str(&details_text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(err)))?;

    Ok(AutomationLogEntry {
        id: uuid_column(0, row.get(0)?)?,
        kind: row.get(1)?,
        outcome,
        message: row.get(3)?,
        details,
        related_template_id: uuid_column_opt(5, row.get(5)?)?,
        created_at: row.get(6)?,
    })
}

#[async_trait]
impl AutomationLog for SqliteAutomationLog {
    #[instrument(skip(self, entry), fields(kind = %entry.kind, outcome = %entry.outcome.as_str()))]
    async fn append(&self, entry: AutomationLogEntry) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO automation_log (
                id, kind, outcome, message, details, related_template_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id.to_string(),
                entry.kind,
                entry.outcome.as_str(),
                entry.message,
                entry.details.to_string(),
                entry.related_template_id.map(|id| id.to_string()),
                entry.created_at,
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}
