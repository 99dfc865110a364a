//! Occurrence materialization - expanding templates into dated occurrences
//!
//! Turns the active template set into concrete occurrences for one week
//! window and reconciles the result with what is already stored. The
//! reconciliation never touches an occurrence that has a linked meeting,
//! so re-running materialization cannot orphan meeting links.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use classline_domain::{
    constants::WINDOW_DAYS, OccurrenceWrite, Result, ScheduledOccurrence, WindowChanges,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::expansion;
use crate::lock_map::LockMap;
use crate::ports::{OccurrenceRepository, TemplateRepository};

/// Materializes weekly occurrence windows from course templates.
pub struct MaterializerService {
    templates: Arc<dyn TemplateRepository>,
    occurrences: Arc<dyn OccurrenceRepository>,
    window_locks: LockMap<NaiveDate>,
}

impl MaterializerService {
    /// Create a new materializer service.
    pub fn new(
        templates: Arc<dyn TemplateRepository>,
        occurrences: Arc<dyn OccurrenceRepository>,
    ) -> Self {
        Self { templates, occurrences, window_locks: LockMap::new() }
    }

    /// Materialize and reconcile the week containing `week_start`.
    ///
    /// The input date is normalized to the Monday on or before it.
    /// Concurrent calls for the same window are serialized; two racing
    /// generators could otherwise both decide an occurrence does not exist
    /// yet and double-insert.
    ///
    /// Reconciliation policy per active template:
    /// - an existing occurrence with a linked meeting is kept unchanged;
    /// - an existing unlinked occurrence is rewritten in place with freshly
    ///   computed fields, keeping its id;
    /// - a missing occurrence is inserted.
    ///
    /// Occurrences whose template left the active set are deleted. The
    /// whole plan commits atomically.
    #[instrument(skip(self), fields(week_start = %week_start))]
    pub async fn generate_week(&self, week_start: NaiveDate) -> Result<Vec<ScheduledOccurrence>> {
        let week_start = expansion::week_monday(week_start);
        let week_end = week_start + Duration::days(WINDOW_DAYS);

        let lock = self.window_locks.acquire(week_start);
        let _guard = lock.lock().await;

        let rows = self.templates.list_active().await?;
        let existing = self.occurrences.find_window(week_start).await?;
        let existing_by_template: HashMap<Uuid, &ScheduledOccurrence> =
            existing.iter().map(|occ| (occ.template_id, occ)).collect();

        let mut changes = WindowChanges::default();
        let mut skipped = 0usize;

        for row in &rows {
            let template = match row.validate() {
                Ok(template) => template,
                Err(err) => {
                    warn!(template_id = %row.id, error = %err, "skipping malformed template");
                    skipped += 1;
                    continue;
                }
            };

            let Some(expanded) = expansion::expand(&template, week_start, week_end) else {
                continue;
            };

            match existing_by_template.get(&template.id) {
                Some(occurrence) if occurrence.meeting_id.is_some() => {
                    debug!(
                        template_id = %template.id,
                        occurrence_id = %occurrence.id,
                        "occurrence has a linked meeting, keeping it unchanged"
                    );
                }
                Some(occurrence) => {
                    changes.upserts.push(occurrence_write(occurrence.id, &template, &expanded));
                }
                None => {
                    changes.upserts.push(occurrence_write(Uuid::new_v4(), &template, &expanded));
                }
            }
        }

        let active_ids: std::collections::HashSet<Uuid> = rows.iter().map(|row| row.id).collect();
        for occurrence in &existing {
            if !active_ids.contains(&occurrence.template_id) {
                debug!(
                    occurrence_id = %occurrence.id,
                    template_id = %occurrence.template_id,
                    "template no longer active, removing occurrence"
                );
                changes.deletes.push(occurrence.id);
            }
        }

        if !changes.is_empty() {
            self.occurrences.apply_window(changes.clone()).await?;
        }

        info!(
            week_start = %week_start,
            templates = rows.len(),
            skipped,
            upserts = changes.upserts.len(),
            deletes = changes.deletes.len(),
            "window materialized"
        );

        self.occurrences.find_window(week_start).await
    }
}

fn occurrence_write(
    id: Uuid,
    template: &classline_domain::CourseTemplate,
    expanded: &expansion::ExpandedOccurrence,
) -> OccurrenceWrite {
    OccurrenceWrite {
        id,
        template_id: template.id,
        course_name: template.course_name.clone(),
        level: template.level,
        teacher_name: template.teacher_name.clone(),
        duration_minutes: template.duration_minutes,
        messaging_group_id: template.messaging_group_id.clone(),
        scheduled_date: expanded.date,
        scheduled_time: template.time_of_day,
    }
}
