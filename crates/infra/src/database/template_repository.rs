//! SQLite implementation of the TemplateRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use classline_core::TemplateRepository;
use classline_domain::{Result, TemplateRow};
use rusqlite::{params, Row};
use tracing::instrument;
use uuid::Uuid;

use super::{uuid_column, DbManager};
use crate::errors::InfraError;

/// SQLite-backed course template store.
pub struct SqliteTemplateRepository {
    db: Arc<DbManager>,
}

impl SqliteTemplateRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert a template row. Templates are owned by the surrounding CRUD
    /// layer, so this is an inherent method rather than part of the port.
    pub fn insert(&self, row: &TemplateRow) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO course_templates (
                id, course_name, level_code, teacher_name, day_of_week,
                time_of_day, duration_minutes, messaging_group_id,
                host_identity, active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                row.id.to_string(),
                row.course_name,
                row.level_code,
                row.teacher_name,
                row.day_of_week,
                row.time_of_day,
                row.duration_minutes,
                row.messaging_group_id,
                row.host_identity,
                row.active,
                Utc::now(),
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    /// Flip the active flag on a template.
    pub fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        let conn = self.db.get_connection()?;
        let updated = conn
            .execute(
                "UPDATE course_templates SET active = ?2 WHERE id = ?1",
                params![id.to_string(), active],
            )
            .map_err(InfraError::from)?;
        if updated == 0 {
            return Err(classline_domain::ClasslineError::NotFound(format!(
                "template {id} not found"
            )));
        }
        Ok(())
    }
}

fn map_template_row(row: &Row<'_>) -> rusqlite::Result<TemplateRow> {
    Ok(TemplateRow {
        id: uuid_column(0, row.get(0)?)?,
        course_name: row.get(1)?,
        level_code: row.get(2)?,
        teacher_name: row.get(3)?,
        day_of_week: row.get(4)?,
        time_of_day: row.get(5)?,
        duration_minutes: row.get(6)?,
        messaging_group_id: row.get(7)?,
        host_identity: row.get(8)?,
        active: row.get(9)?,
    })
}

const SELECT_COLUMNS: &str = "id, course_name, level_code, teacher_name, day_of_week, \
     time_of_day, duration_minutes, messaging_group_id, host_identity, active";

#[async_trait]
impl TemplateRepository for SqliteTemplateRepository {
    #[instrument(skip(self))]
    async fn list_active(&self) -> Result<Vec<TemplateRow>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM course_templates
                 WHERE active = 1
                 ORDER BY course_name, id"
            ))
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map([], map_template_row)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn find(&self, id: Uuid) -> Result<Option<TemplateRow>> {
        let conn = self.db.get_connection()?;
        let result = conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM course_templates WHERE id = ?1"),
            params![id.to_string()],
            map_template_row,
        );

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}
