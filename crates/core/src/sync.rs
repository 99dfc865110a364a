//! Meeting synchronization - provisioning external recurring meetings
//!
//! Drives creation of one external recurring meeting per template and
//! records the outcome on the occurrence. A template that already owns a
//! meeting record is idempotent success: the occurrence is linked to the
//! existing record and the provider is not called again.

use std::sync::Arc;

use chrono_tz::Tz;
use classline_domain::{
    AutomationLogEntry, ClasslineError, MeetingRecord, OccurrenceStatus, RecurringMeetingRequest,
    Result, ScheduledOccurrence,
};
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::expansion;
use crate::lock_map::LockMap;
use crate::ports::{
    AutomationLog, MeetingProvider, MeetingRepository, OccurrenceRepository, TemplateRepository,
};

/// Log entry kind written for every synchronization attempt.
const LOG_KIND: &str = "meeting_sync";

/// How a sync call obtained its meeting record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// A new external meeting was provisioned.
    Created,
    /// The template already had an active record; it was reused.
    Reused,
}

impl SyncAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Reused => "reused",
        }
    }
}

/// Synchronizes scheduled occurrences with the external meeting provider.
pub struct SyncService {
    occurrences: Arc<dyn OccurrenceRepository>,
    templates: Arc<dyn TemplateRepository>,
    meetings: Arc<dyn MeetingRepository>,
    provider: Arc<dyn MeetingProvider>,
    log: Arc<dyn AutomationLog>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    bulk_parallelism: usize,
    template_locks: LockMap<Uuid>,
}

impl SyncService {
    /// Create a new sync service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        occurrences: Arc<dyn OccurrenceRepository>,
        templates: Arc<dyn TemplateRepository>,
        meetings: Arc<dyn MeetingRepository>,
        provider: Arc<dyn MeetingProvider>,
        log: Arc<dyn AutomationLog>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
        bulk_parallelism: usize,
    ) -> Self {
        Self {
            occurrences,
            templates,
            meetings,
            provider,
            log,
            clock,
            timezone,
            bulk_parallelism: bulk_parallelism.max(1),
            template_locks: LockMap::new(),
        }
    }

    /// Synchronize one occurrence.
    ///
    /// Every attempt appends exactly one automation log entry. Failures are
    /// returned as values, never swallowed; the occurrence is marked failed
    /// so the admin view reflects the outcome, and a later caller-triggered
    /// retry can move it to scheduled.
    #[instrument(skip(self), fields(occurrence_id = %occurrence_id))]
    pub async fn sync(&self, occurrence_id: Uuid) -> Result<MeetingRecord> {
        let occurrence = match self.occurrences.find_by_id(occurrence_id).await? {
            Some(occurrence) => occurrence,
            None => {
                let err =
                    ClasslineError::NotFound(format!("occurrence {occurrence_id} not found"));
                self.log_failure(occurrence_id, None, &err).await;
                return Err(err);
            }
        };

        let template_id = occurrence.template_id;
        match self.sync_occurrence(&occurrence).await {
            Ok((record, action)) => {
                info!(
                    occurrence_id = %occurrence.id,
                    template_id = %template_id,
                    external_meeting_id = %record.external_meeting_id,
                    action = action.as_str(),
                    "occurrence synchronized"
                );
                self.log_success(&occurrence, &record, action).await;
                Ok(record)
            }
            Err(err) => {
                if let Err(mark_err) = self.occurrences.mark_failed(occurrence.id).await {
                    error!(
                        occurrence_id = %occurrence.id,
                        error = %mark_err,
                        "failed to persist occurrence failure status"
                    );
                }
                self.log_failure(occurrence.id, Some(template_id), &err).await;
                Err(err)
            }
        }
    }

    /// Synchronize many occurrences with independent per-item outcomes.
    ///
    /// Returns one result per input id, in input order, so partial success
    /// is reportable. Items run concurrently under a semaphore; per-template
    /// locks still guarantee at most one meeting per template. Items are
    /// spawned tasks, so a caller abandoning the bulk future does not stop
    /// in-flight items from persisting their outcome.
    pub async fn sync_bulk(self: &Arc<Self>, ids: &[Uuid]) -> Vec<Result<MeetingRecord>> {
        let semaphore = Arc::new(Semaphore::new(self.bulk_parallelism));

        let handles: Vec<_> = ids
            .iter()
            .copied()
            .map(|id| {
                let service = Arc::clone(self);
                let semaphore = Arc::clone(&semaphore);
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| ClasslineError::Internal("bulk semaphore closed".into()))?;
                    service.sync(id).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(err) => Err(ClasslineError::Internal(format!("sync task failed: {err}"))),
            });
        }
        results
    }

    async fn sync_occurrence(
        &self,
        occurrence: &ScheduledOccurrence,
    ) -> Result<(MeetingRecord, SyncAction)> {
        let row = self.templates.find(occurrence.template_id).await?.ok_or_else(|| {
            ClasslineError::NotFound(format!("template {} not found", occurrence.template_id))
        })?;
        let template = row.validate()?;

        // Decide-and-commit for this template happens under its lock; other
        // templates are unaffected while the provider call is in flight.
        let lock = self.template_locks.acquire(template.id);
        let _guard = lock.lock().await;

        if let Some(record) = self.meetings.find_by_template(template.id).await? {
            self.link(occurrence, &record).await?;
            return Ok((record, SyncAction::Reused));
        }

        let now_local = self.clock.now_utc().with_timezone(&self.timezone).naive_local();
        let first_start =
            expansion::first_future_start(template.day_of_week, template.time_of_day, now_local);

        let request = RecurringMeetingRequest {
            host_identity: template.host_identity.clone(),
            topic: format!("{} ({})", template.course_name, template.teacher_name),
            first_start,
            duration_minutes: template.duration_minutes,
            weekday: template.day_of_week,
        };

        let meeting = self.provider.create_recurring_meeting(&request).await?;

        let record = MeetingRecord {
            id: Uuid::new_v4(),
            template_id: template.id,
            external_meeting_id: meeting.external_meeting_id,
            join_url: meeting.join_url,
            first_occurrence_start: meeting.first_start,
            provider_status: meeting.provider_status,
            created_at: chrono::Utc::now(),
        };

        match self.meetings.insert(&record).await {
            Ok(()) => {}
            Err(ClasslineError::Conflict(_)) => {
                // Lost a race with another writer; reuse whichever record won.
                warn!(template_id = %template.id, "meeting record already exists, reusing it");
                if let Some(existing) = self.meetings.find_by_template(template.id).await? {
                    self.link(occurrence, &existing).await?;
                    return Ok((existing, SyncAction::Reused));
                }
                return Err(ClasslineError::Conflict(format!(
                    "meeting record conflict for template {}",
                    template.id
                )));
            }
            Err(err) => return Err(err),
        }

        self.link(occurrence, &record).await?;
        Ok((record, SyncAction::Created))
    }

    async fn link(&self, occurrence: &ScheduledOccurrence, record: &MeetingRecord) -> Result<()> {
        if occurrence.meeting_id == Some(record.id)
            && occurrence.status == OccurrenceStatus::Scheduled
        {
            return Ok(());
        }
        self.occurrences.link_meeting(occurrence.id, record.id).await
    }

    async fn log_success(
        &self,
        occurrence: &ScheduledOccurrence,
        record: &MeetingRecord,
        action: SyncAction,
    ) {
        let entry = AutomationLogEntry::success(
            LOG_KIND,
            format!("meeting {} for occurrence {}", action.as_str(), occurrence.id),
            serde_json::json!({
                "occurrence_id": occurrence.id,
                "meeting_record_id": record.id,
                "external_meeting_id": record.external_meeting_id,
                "action": action.as_str(),
            }),
            Some(occurrence.template_id),
        );
        self.append_entry(entry).await;
    }

    async fn log_failure(
        &self,
        occurrence_id: Uuid,
        template_id: Option<Uuid>,
        err: &ClasslineError,
    ) {
        let entry = AutomationLogEntry::error(
            LOG_KIND,
            format!("sync failed for occurrence {occurrence_id}"),
            serde_json::json!({
                "occurrence_id": occurrence_id,
                "error": err.to_string(),
            }),
            template_id,
        );
        self.append_entry(entry).await;
    }

    async fn append_entry(&self, entry: AutomationLogEntry) {
        if let Err(err) = self.log.append(entry).await {
            error!(error = %err, "failed to append automation log entry");
        }
    }
}
