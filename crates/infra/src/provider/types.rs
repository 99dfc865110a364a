//! Wire types for the meeting provider API.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Meeting type code for a recurring meeting with fixed times.
pub(crate) const MEETING_TYPE_RECURRING_FIXED: u8 = 8;
/// Recurrence type code for weekly repetition.
pub(crate) const RECURRENCE_TYPE_WEEKLY: u8 = 2;

/// Response body of the client-credentials token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

/// Request body for creating a recurring meeting.
#[derive(Debug, Serialize)]
pub(crate) struct CreateMeetingBody {
    pub topic: String,
    #[serde(rename = "type")]
    pub meeting_type: u8,
    pub start_time: String,
    pub duration: i64,
    pub timezone: String,
    pub recurrence: RecurrenceBody,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecurrenceBody {
    #[serde(rename = "type")]
    pub recurrence_type: u8,
    pub repeat_interval: u8,
    pub weekly_days: String,
    pub end_times: u32,
}

/// Provider response for a created meeting.
#[derive(Debug, Deserialize)]
pub(crate) struct MeetingResponse {
    pub id: i64,
    pub join_url: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Provider weekday numbering: 1 = Sunday through 7 = Saturday.
pub(crate) fn provider_weekday(weekday: Weekday) -> u32 {
    weekday.num_days_from_sunday() + 1
}
