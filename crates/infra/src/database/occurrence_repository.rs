//! SQLite implementation of the OccurrenceRepository port.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use classline_core::OccurrenceRepository;
use classline_domain::{
    ClasslineError, CourseLevel, OccurrenceStatus, Result, ScheduledOccurrence, WindowChanges,
};
use rusqlite::types::Type;
use rusqlite::{params, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{uuid_column, uuid_column_opt, DbManager};
use crate::errors::InfraError;

/// SQLite-backed store for materialized occurrences.
pub struct SqliteOccurrenceRepository {
    db: Arc<DbManager>,
}

impl SqliteOccurrenceRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

const SELECT_COLUMNS: &str = "id, template_id, course_name, level_code, teacher_name, \
     duration_minutes, messaging_group_id, scheduled_date, scheduled_time, meeting_id, \
     status, created_at";

fn map_occurrence_row(row: &Row<'_>) -> rusqlite::Result<ScheduledOccurrence> {
    let level_code: String = row.get(3)?;
    let level = CourseLevel::from_code(&level_code)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(err)))?;

    let status_text: String = row.get(10)?;
    let status = OccurrenceStatus::from_str(&status_text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(err)))?;

    Ok(ScheduledOccurrence {
        id: uuid_column(0, row.get(0)?)?,
        template_id: uuid_column(1, row.get(1)?)?,
        course_name: row.get(2)?,
        level,
        teacher_name: row.get(4)?,
        duration_minutes: row.get(5)?,
        messaging_group_id: row.get(6)?,
        scheduled_date: row.get(7)?,
        scheduled_time: row.get(8)?,
        meeting_id: uuid_column_opt(9, row.get(9)?)?,
        status,
        created_at: row.get(11)?,
    })
}

#[async_trait]
impl OccurrenceRepository for SqliteOccurrenceRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledOccurrence>> {
        let conn = self.db.get_connection()?;
        let result = conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM scheduled_occurrences WHERE id = ?1"),
            params![id.to_string()],
            map_occurrence_row,
        );

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }

    async fn find_window(&self, week_start: NaiveDate) -> Result<Vec<ScheduledOccurrence>> {
        self.list_in_range(week_start, week_start + Duration::days(7)).await
    }

    #[instrument(skip(self))]
    async fn list_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduledOccurrence>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM scheduled_occurrences
                 WHERE scheduled_date >= ?1 AND scheduled_date < ?2
                 ORDER BY scheduled_date, scheduled_time, id"
            ))
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(params![from, to], map_occurrence_row)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;
        Ok(rows)
    }

    #[instrument(skip(self, changes), fields(upserts = changes.upserts.len(), deletes = changes.deletes.len()))]
    async fn apply_window(&self, changes: WindowChanges) -> Result<()> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction().map_err(InfraError::from)?;

        for id in &changes.deletes {
            tx.execute(
                "DELETE FROM scheduled_occurrences WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(InfraError::from)?;
        }

        // Upserts rewrite an existing row in place, keeping its id and
        // creation timestamp while resetting its sync state.
        for write in &changes.upserts {
            tx.execute(
                "INSERT INTO scheduled_occurrences (
                    id, template_id, course_name, level_code, teacher_name,
                    duration_minutes, messaging_group_id, scheduled_date,
                    scheduled_time, meeting_id, status, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, 'pending', ?10)
                ON CONFLICT(id) DO UPDATE SET
                    course_name = excluded.course_name,
                    level_code = excluded.level_code,
                    teacher_name = excluded.teacher_name,
                    duration_minutes = excluded.duration_minutes,
                    messaging_group_id = excluded.messaging_group_id,
                    scheduled_date = excluded.scheduled_date,
                    scheduled_time = excluded.scheduled_time,
                    meeting_id = NULL,
                    status = 'pending'",
                params![
                    write.id.to_string(),
                    write.template_id.to_string(),
                    write.course_name,
                    write.level.as_code(),
                    write.teacher_name,
                    write.duration_minutes,
                    write.messaging_group_id,
                    write.scheduled_date,
                    write.scheduled_time,
                    Utc::now(),
                ],
            )
            .map_err(InfraError::from)?;
        }

        tx.commit().map_err(InfraError::from)?;
        debug!(
            upserts = changes.upserts.len(),
            deletes = changes.deletes.len(),
            "window changes committed"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn link_meeting(&self, occurrence_id: Uuid, meeting_id: Uuid) -> Result<()> {
        let conn = self.db.get_connection()?;
        let updated = conn
            .execute(
                "UPDATE scheduled_occurrences SET meeting_id = ?2, status = 'scheduled'
                 WHERE id = ?1",
                params![occurrence_id.to_string(), meeting_id.to_string()],
            )
            .map_err(InfraError::from)?;
        if updated == 0 {
            return Err(ClasslineError::NotFound(format!(
                "occurrence {occurrence_id} not found"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_failed(&self, occurrence_id: Uuid) -> Result<()> {
        let conn = self.db.get_connection()?;
        let updated = conn
            .execute(
                "UPDATE scheduled_occurrences SET status = 'failed' WHERE id = ?1",
                params![occurrence_id.to_string()],
            )
            .map_err(InfraError::from)?;
        if updated == 0 {
            return Err(ClasslineError::NotFound(format!(
                "occurrence {occurrence_id} not found"
            )));
        }
        Ok(())
    }
}
