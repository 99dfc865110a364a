//! Mock repository implementations for testing
//!
//! Provides in-memory mocks for all core ports, enabling deterministic
//! tests without database or network dependencies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use classline_core::ports::{
    AutomationLog, MeetingProvider, MeetingRepository, OccurrenceRepository, TemplateRepository,
};
use classline_domain::{
    AutomationLogEntry, ClasslineError, MeetingRecord, OccurrenceStatus, ProvisionedMeeting,
    RecurringMeetingRequest, Result as DomainResult, ScheduledOccurrence, TemplateRow,
    WindowChanges,
};
use uuid::Uuid;

/// In-memory mock for `TemplateRepository`.
#[derive(Default)]
pub struct MockTemplateRepository {
    rows: Mutex<Vec<TemplateRow>>,
}

impl MockTemplateRepository {
    pub fn new(rows: Vec<TemplateRow>) -> Self {
        Self { rows: Mutex::new(rows) }
    }

    /// Add a row to the mock store.
    pub fn push(&self, row: TemplateRow) {
        self.rows.lock().unwrap().push(row);
    }

    /// Flip a template's active flag.
    pub fn set_active(&self, id: Uuid, active: bool) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|row| row.id == id) {
            row.active = active;
        }
    }
}

#[async_trait]
impl TemplateRepository for MockTemplateRepository {
    async fn list_active(&self) -> DomainResult<Vec<TemplateRow>> {
        Ok(self.rows.lock().unwrap().iter().filter(|row| row.active).cloned().collect())
    }

    async fn find(&self, id: Uuid) -> DomainResult<Option<TemplateRow>> {
        Ok(self.rows.lock().unwrap().iter().find(|row| row.id == id).cloned())
    }
}

/// In-memory mock for `OccurrenceRepository`.
///
/// `apply_window` mirrors the SQL implementation: upserts keep the original
/// creation timestamp, reset status to pending and clear the meeting link.
#[derive(Default)]
pub struct MockOccurrenceRepository {
    occurrences: Mutex<HashMap<Uuid, ScheduledOccurrence>>,
}

impl MockOccurrenceRepository {
    /// Directly seed an occurrence, bypassing materialization.
    pub fn insert_raw(&self, occurrence: ScheduledOccurrence) {
        self.occurrences.lock().unwrap().insert(occurrence.id, occurrence);
    }

    /// Snapshot of one occurrence for assertions.
    pub fn get(&self, id: Uuid) -> Option<ScheduledOccurrence> {
        self.occurrences.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl OccurrenceRepository for MockOccurrenceRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<ScheduledOccurrence>> {
        Ok(self.occurrences.lock().unwrap().get(&id).cloned())
    }

    async fn find_window(&self, week_start: NaiveDate) -> DomainResult<Vec<ScheduledOccurrence>> {
        self.list_in_range(week_start, week_start + chrono::Duration::days(7)).await
    }

    async fn list_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<ScheduledOccurrence>> {
        let mut rows: Vec<ScheduledOccurrence> = self
            .occurrences
            .lock()
            .unwrap()
            .values()
            .filter(|occ| occ.scheduled_date >= from && occ.scheduled_date < to)
            .cloned()
            .collect();
        rows.sort_by_key(|occ| (occ.scheduled_date, occ.scheduled_time, occ.id));
        Ok(rows)
    }

    async fn apply_window(&self, changes: WindowChanges) -> DomainResult<()> {
        let mut occurrences = self.occurrences.lock().unwrap();

        for write in changes.upserts {
            let created_at =
                occurrences.get(&write.id).map_or_else(Utc::now, |existing| existing.created_at);
            occurrences.insert(
                write.id,
                ScheduledOccurrence {
                    id: write.id,
                    template_id: write.template_id,
                    course_name: write.course_name,
                    level: write.level,
                    teacher_name: write.teacher_name,
                    duration_minutes: write.duration_minutes,
                    messaging_group_id: write.messaging_group_id,
                    scheduled_date: write.scheduled_date,
                    scheduled_time: write.scheduled_time,
                    meeting_id: None,
                    status: OccurrenceStatus::Pending,
                    created_at,
                },
            );
        }

        for id in changes.deletes {
            occurrences.remove(&id);
        }

        Ok(())
    }

    async fn link_meeting(&self, occurrence_id: Uuid, meeting_id: Uuid) -> DomainResult<()> {
        let mut occurrences = self.occurrences.lock().unwrap();
        let occurrence = occurrences.get_mut(&occurrence_id).ok_or_else(|| {
            ClasslineError::NotFound(format!("occurrence {occurrence_id} not found"))
        })?;
        occurrence.meeting_id = Some(meeting_id);
        occurrence.status = OccurrenceStatus::Scheduled;
        Ok(())
    }

    async fn mark_failed(&self, occurrence_id: Uuid) -> DomainResult<()> {
        let mut occurrences = self.occurrences.lock().unwrap();
        let occurrence = occurrences.get_mut(&occurrence_id).ok_or_else(|| {
            ClasslineError::NotFound(format!("occurrence {occurrence_id} not found"))
        })?;
        occurrence.status = OccurrenceStatus::Failed;
        Ok(())
    }
}

/// In-memory mock for `MeetingRepository` with the same one-record-per-
/// template constraint the SQL schema enforces.
#[derive(Default)]
pub struct MockMeetingRepository {
    records: Mutex<HashMap<Uuid, MeetingRecord>>,
}

impl MockMeetingRepository {
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl MeetingRepository for MockMeetingRepository {
    async fn insert(&self, record: &MeetingRecord) -> DomainResult<()> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.template_id) {
            return Err(ClasslineError::Conflict(format!(
                "meeting record already exists for template {}",
                record.template_id
            )));
        }
        records.insert(record.template_id, record.clone());
        Ok(())
    }

    async fn find_by_template(&self, template_id: Uuid) -> DomainResult<Option<MeetingRecord>> {
        Ok(self.records.lock().unwrap().get(&template_id).cloned())
    }
}

/// In-memory mock for the automation log sink.
#[derive(Default)]
pub struct MockAutomationLog {
    entries: Mutex<Vec<AutomationLogEntry>>,
}

impl MockAutomationLog {
    pub fn entries(&self) -> Vec<AutomationLogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AutomationLog for MockAutomationLog {
    async fn append(&self, entry: AutomationLogEntry) -> DomainResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

/// Scripted meeting provider.
///
/// Succeeds by default; hosts registered via [`fail_host`] get a provider
/// error instead. A small artificial delay widens race windows in
/// concurrency tests.
///
/// [`fail_host`]: MockMeetingProvider::fail_host
#[derive(Default)]
pub struct MockMeetingProvider {
    failing_hosts: Mutex<Vec<String>>,
    requests: Mutex<Vec<RecurringMeetingRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockMeetingProvider {
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::default() }
    }

    /// Make calls for this host identity fail.
    pub fn fail_host(&self, host_identity: &str) {
        self.failing_hosts.lock().unwrap().push(host_identity.to_string());
    }

    /// Let a previously failing host succeed again.
    pub fn recover_host(&self, host_identity: &str) {
        self.failing_hosts.lock().unwrap().retain(|host| host != host_identity);
    }

    /// Number of provider calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests the provider received, in call order.
    pub fn requests(&self) -> Vec<RecurringMeetingRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MeetingProvider for MockMeetingProvider {
    async fn create_recurring_meeting(
        &self,
        request: &RecurringMeetingRequest,
    ) -> DomainResult<ProvisionedMeeting> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_hosts.lock().unwrap().contains(&request.host_identity) {
            return Err(ClasslineError::Provider(format!(
                "meeting API rejected host {}",
                request.host_identity
            )));
        }

        Ok(ProvisionedMeeting {
            external_meeting_id: format!("ext-{}", self.calls.load(Ordering::SeqCst)),
            join_url: format!("https://meetings.test/j/{}", Uuid::new_v4()),
            first_start: request.first_start,
            provider_status: "waiting".to_string(),
        })
    }
}
