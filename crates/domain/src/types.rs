//! Common data types used throughout the application

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ClasslineError, Result};

/// Proficiency level of a course, persisted as a short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    /// Short code used in storage.
    #[must_use]
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Beginner => "beg",
            Self::Intermediate => "int",
            Self::Advanced => "adv",
        }
    }

    /// Parse a stored short code.
    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "beg" => Ok(Self::Beginner),
            "int" => Ok(Self::Intermediate),
            "adv" => Ok(Self::Advanced),
            other => Err(ClasslineError::Validation(format!("unknown course level code: {other}"))),
        }
    }
}

impl fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        write!(f, "{name}")
    }
}

/// Raw course template as read from the template store.
///
/// Weekday and time-of-day are kept as the stored strings; [`validate`]
/// turns a row into a [`CourseTemplate`] or rejects it with a validation
/// error. Validation happens once at the store boundary so the scheduling
/// core only ever sees typed values.
///
/// [`validate`]: TemplateRow::validate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRow {
    pub id: Uuid,
    pub course_name: String,
    pub level_code: String,
    pub teacher_name: String,
    pub day_of_week: String,
    pub time_of_day: String,
    pub duration_minutes: i64,
    pub messaging_group_id: Option<String>,
    pub host_identity: String,
    pub active: bool,
}

impl TemplateRow {
    /// Validate the raw row into a typed template.
    ///
    /// # Errors
    /// Returns `ClasslineError::Validation` for an unrecognized weekday,
    /// a malformed time-of-day, an unknown level code, or a non-positive
    /// duration.
    pub fn validate(&self) -> Result<CourseTemplate> {
        let day_of_week = Weekday::from_str(&self.day_of_week).map_err(|_| {
            ClasslineError::Validation(format!(
                "template {}: unrecognized day of week '{}'",
                self.id, self.day_of_week
            ))
        })?;

        let time_of_day = parse_time_of_day(&self.time_of_day).map_err(|_| {
            ClasslineError::Validation(format!(
                "template {}: malformed time of day '{}'",
                self.id, self.time_of_day
            ))
        })?;

        let level = CourseLevel::from_code(&self.level_code).map_err(|_| {
            ClasslineError::Validation(format!(
                "template {}: unknown level code '{}'",
                self.id, self.level_code
            ))
        })?;

        if self.duration_minutes <= 0 {
            return Err(ClasslineError::Validation(format!(
                "template {}: duration must be positive, got {}",
                self.id, self.duration_minutes
            )));
        }

        Ok(CourseTemplate {
            id: self.id,
            course_name: self.course_name.clone(),
            level,
            teacher_name: self.teacher_name.clone(),
            day_of_week,
            time_of_day,
            duration_minutes: self.duration_minutes,
            messaging_group_id: self.messaging_group_id.clone(),
            host_identity: self.host_identity.clone(),
            active: self.active,
        })
    }
}

fn parse_time_of_day(value: &str) -> std::result::Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
}

/// Weekly-recurring course definition, validated at the store boundary.
///
/// One template describes exactly one weekday + time slot; a course taught
/// on two days is two templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseTemplate {
    pub id: Uuid,
    pub course_name: String,
    pub level: CourseLevel,
    pub teacher_name: String,
    pub day_of_week: Weekday,
    pub time_of_day: NaiveTime,
    pub duration_minutes: i64,
    pub messaging_group_id: Option<String>,
    pub host_identity: String,
    pub active: bool,
}

/// Lifecycle state of a scheduled occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceStatus {
    Pending,
    Scheduled,
    Failed,
}

impl OccurrenceStatus {
    /// String form used in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for OccurrenceStatus {
    type Err = ClasslineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "scheduled" => Ok(Self::Scheduled),
            "failed" => Ok(Self::Failed),
            other => {
                Err(ClasslineError::Validation(format!("unknown occurrence status: {other}")))
            }
        }
    }
}

impl fmt::Display for OccurrenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete dated instance of a course template.
///
/// Course fields are denormalized from the template at materialization time
/// so later template edits do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledOccurrence {
    pub id: Uuid,
    pub template_id: Uuid,
    pub course_name: String,
    pub level: CourseLevel,
    pub teacher_name: String,
    pub duration_minutes: i64,
    pub messaging_group_id: Option<String>,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub meeting_id: Option<Uuid>,
    pub status: OccurrenceStatus,
    pub created_at: DateTime<Utc>,
}

/// Upsert payload for one occurrence inside a materialization window.
///
/// When `id` refers to an existing row the row is rewritten in place
/// (keeping its id and creation timestamp); otherwise a new row is
/// inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceWrite {
    pub id: Uuid,
    pub template_id: Uuid,
    pub course_name: String,
    pub level: CourseLevel,
    pub teacher_name: String,
    pub duration_minutes: i64,
    pub messaging_group_id: Option<String>,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
}

/// Reconciliation plan for one week window, committed atomically by the
/// occurrence repository.
#[derive(Debug, Clone, Default)]
pub struct WindowChanges {
    pub upserts: Vec<OccurrenceWrite>,
    pub deletes: Vec<Uuid>,
}

impl WindowChanges {
    /// True when the plan would not touch storage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// Result of successfully provisioning an external recurring meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub id: Uuid,
    pub template_id: Uuid,
    pub external_meeting_id: String,
    pub join_url: String,
    pub first_occurrence_start: NaiveDateTime,
    pub provider_status: String,
    pub created_at: DateTime<Utc>,
}

/// Request handed to the meeting provider when creating a recurring
/// meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringMeetingRequest {
    pub host_identity: String,
    pub topic: String,
    pub first_start: NaiveDateTime,
    pub duration_minutes: i64,
    pub weekday: Weekday,
}

/// Provider response for a created recurring meeting, before a
/// [`MeetingRecord`] is persisted.
#[derive(Debug, Clone)]
pub struct ProvisionedMeeting {
    pub external_meeting_id: String,
    pub join_url: String,
    pub first_start: NaiveDateTime,
    pub provider_status: String,
}

/// Outcome of an automation log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutcome {
    Success,
    Error,
}

impl LogOutcome {
    /// String form used in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogOutcome {
    type Err = ClasslineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(ClasslineError::Validation(format!("unknown log outcome: {other}"))),
        }
    }
}

/// Append-only audit record of one synchronization attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationLogEntry {
    pub id: Uuid,
    pub kind: String,
    pub outcome: LogOutcome,
    pub message: String,
    pub details: serde_json::Value,
    pub related_template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl AutomationLogEntry {
    /// Build a success entry stamped with the current time.
    #[must_use]
    pub fn success(
        kind: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
        related_template_id: Option<Uuid>,
    ) -> Self {
        Self::new(kind, LogOutcome::Success, message, details, related_template_id)
    }

    /// Build an error entry stamped with the current time.
    #[must_use]
    pub fn error(
        kind: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
        related_template_id: Option<Uuid>,
    ) -> Self {
        Self::new(kind, LogOutcome::Error, message, details, related_template_id)
    }

    fn new(
        kind: impl Into<String>,
        outcome: LogOutcome,
        message: impl Into<String>,
        details: serde_json::Value,
        related_template_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            outcome,
            message: message.into(),
            details,
            related_template_id,
            created_at: Utc::now(),
        }
    }
}

/// Cached bearer credential for the external meeting provider.
///
/// Process-wide but never persisted; held by an injectable token cache so
/// tests can substitute a fake provider or clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLease {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenLease {
    /// Create a lease expiring `expires_in` seconds from now.
    #[must_use]
    pub fn new(access_token: String, expires_in: i64) -> Self {
        Self { access_token, expires_at: Utc::now() + chrono::Duration::seconds(expires_in) }
    }

    /// Check whether the lease is expired or will expire within the given
    /// safety margin.
    #[must_use]
    pub fn is_expired(&self, margin_seconds: i64) -> bool {
        Utc::now() + chrono::Duration::seconds(margin_seconds) >= self.expires_at
    }
}
