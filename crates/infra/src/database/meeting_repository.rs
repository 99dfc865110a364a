//! SQLite implementation of the MeetingRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use classline_core::MeetingRepository;
use classline_domain::{MeetingRecord, Result};
use rusqlite::{params, Row};
use tracing::instrument;
use uuid::Uuid;

use super::{uuid_column, DbManager};
use crate::errors::InfraError;

/// SQLite-backed store for provisioned meeting records.
///
/// The table carries a unique constraint on `template_id`; a second insert
/// for the same template surfaces as a conflict.
pub struct SqliteMeetingRepository {
    db: Arc<DbManager>,
}

impl SqliteMeetingRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Look up one meeting record by its own id.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<MeetingRecord>> {
        let conn = self.db.get_connection()?;
        let result = conn.query_row(
            "SELECT id, template_id, external_meeting_id, join_url,
                    first_occurrence_start, provider_status, created_at
             FROM meeting_records WHERE id = ?1",
            params![id.to_string()],
            map_meeting_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}

fn map_meeting_row(row: &Row<'_>) -> rusqlite::Result<MeetingRecord> {
    Ok(MeetingRecord {
        id: uuid_column(0, row.get(0)?)?,
        template_id: uuid_column(1, row.get(1)?)?,
        external_meeting_id: row.get(2)?,
        join_url: row.get(3)?,
        first_occurrence_start: row.get(4)?,
        provider_status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[async_trait]
impl MeetingRepository for SqliteMeetingRepository {
    #[instrument(skip(self, record), fields(template_id = %record.template_id))]
    async fn insert(&self, record: &MeetingRecord) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO meeting_records (
                id, template_id, external_meeting_id, join_url,
                first_occurrence_start, provider_status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.to_string(),
                record.template_id.to_string(),
                record.external_meeting_id,
                record.join_url,
                record.first_occurrence_start,
                record.provider_status,
                record.created_at,
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_template(&self, template_id: Uuid) -> Result<Option<MeetingRecord>> {
        let conn = self.db.get_connection()?;
        let result = conn.query_row(
            "SELECT id, template_id, external_meeting_id, join_url,
                    first_occurrence_start, provider_status, created_at
             FROM meeting_records WHERE template_id = ?1",
            params![template_id.to_string()],
            map_meeting_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}
