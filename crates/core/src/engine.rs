//! Scheduling engine facade
//!
//! The small operation surface exposed to collaborators (admin actions,
//! scheduled jobs, the CRUD layer). Everything else in the surrounding
//! application goes through these four operations.

use std::sync::Arc;

use chrono::NaiveDate;
use classline_domain::{MeetingRecord, Result, ScheduledOccurrence};
use uuid::Uuid;

use crate::materializer::MaterializerService;
use crate::ports::OccurrenceRepository;
use crate::sync::SyncService;

/// Facade over materialization, synchronization and occurrence reads.
pub struct SchedulingEngine {
    materializer: Arc<MaterializerService>,
    sync: Arc<SyncService>,
    occurrences: Arc<dyn OccurrenceRepository>,
}

impl SchedulingEngine {
    /// Create a new engine from its services.
    pub fn new(
        materializer: Arc<MaterializerService>,
        sync: Arc<SyncService>,
        occurrences: Arc<dyn OccurrenceRepository>,
    ) -> Self {
        Self { materializer, sync, occurrences }
    }

    /// Materialize and reconcile one week of occurrences.
    pub async fn generate_week(&self, week_start: NaiveDate) -> Result<Vec<ScheduledOccurrence>> {
        self.materializer.generate_week(week_start).await
    }

    /// Synchronize one occurrence with the meeting provider.
    pub async fn sync_meeting(&self, occurrence_id: Uuid) -> Result<MeetingRecord> {
        self.sync.sync(occurrence_id).await
    }

    /// Synchronize many occurrences; one result per input id, in input
    /// order.
    pub async fn sync_meetings_bulk(&self, occurrence_ids: &[Uuid]) -> Vec<Result<MeetingRecord>> {
        self.sync.sync_bulk(occurrence_ids).await
    }

    /// Occurrences with `from <= scheduled_date < to`, for display.
    pub async fn list_occurrences(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduledOccurrence>> {
        self.occurrences.list_in_range(from, to).await
    }
}
