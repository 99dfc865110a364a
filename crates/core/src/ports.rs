//! Port interfaces for the scheduling engine
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::NaiveDate;
use classline_domain::{
    AutomationLogEntry, MeetingRecord, ProvisionedMeeting, RecurringMeetingRequest, Result,
    ScheduledOccurrence, TemplateRow, WindowChanges,
};
use uuid::Uuid;

/// Read access to the course template store.
///
/// Templates are owned and mutated by the surrounding CRUD layer; the
/// scheduling engine only ever reads them. Rows come back unvalidated so
/// the materializer can skip a malformed template without losing the rest
/// of the batch.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// All templates currently marked active.
    async fn list_active(&self) -> Result<Vec<TemplateRow>>;

    /// Look up one template by id.
    async fn find(&self, id: Uuid) -> Result<Option<TemplateRow>>;
}

/// Persistence for scheduled occurrences.
#[async_trait]
pub trait OccurrenceRepository: Send + Sync {
    /// Look up one occurrence by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledOccurrence>>;

    /// All occurrences with `week_start <= scheduled_date < week_start + 7d`,
    /// ordered by date then time.
    async fn find_window(&self, week_start: NaiveDate) -> Result<Vec<ScheduledOccurrence>>;

    /// All occurrences with `from <= scheduled_date < to`, ordered by date
    /// then time.
    async fn list_in_range(&self, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<ScheduledOccurrence>>;

    /// Commit a materialization plan as one atomic unit. Either every
    /// upsert and delete lands or none do.
    async fn apply_window(&self, changes: WindowChanges) -> Result<()>;

    /// Link an occurrence to a meeting record and mark it scheduled.
    async fn link_meeting(&self, occurrence_id: Uuid, meeting_id: Uuid) -> Result<()>;

    /// Mark an occurrence failed, leaving its meeting link untouched.
    async fn mark_failed(&self, occurrence_id: Uuid) -> Result<()>;
}

/// Persistence for provisioned meeting records.
///
/// Storage enforces at most one record per template; a second insert for
/// the same template is a conflict.
#[async_trait]
pub trait MeetingRepository: Send + Sync {
    /// Persist a new meeting record.
    async fn insert(&self, record: &MeetingRecord) -> Result<()>;

    /// The active meeting record for a template, if any.
    async fn find_by_template(&self, template_id: Uuid) -> Result<Option<MeetingRecord>>;
}

/// Append-only audit log sink.
#[async_trait]
pub trait AutomationLog: Send + Sync {
    /// Append one entry. Entries are never updated or deleted.
    async fn append(&self, entry: AutomationLogEntry) -> Result<()>;
}

/// Client for the external meeting provider.
#[async_trait]
pub trait MeetingProvider: Send + Sync {
    /// Create a weekly-recurring meeting hosted by the given identity.
    async fn create_recurring_meeting(
        &self,
        request: &RecurringMeetingRequest,
    ) -> Result<ProvisionedMeeting>;
}
