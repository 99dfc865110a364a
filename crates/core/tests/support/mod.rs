//! Shared test support for core integration tests

pub mod repositories;

use chrono::NaiveDate;
use classline_domain::TemplateRow;
use uuid::Uuid;

/// Build an active template row with sensible defaults.
pub fn template_row(day_of_week: &str, time_of_day: &str) -> TemplateRow {
    TemplateRow {
        id: Uuid::new_v4(),
        course_name: "General English".to_string(),
        level_code: "int".to_string(),
        teacher_name: "Ana".to_string(),
        day_of_week: day_of_week.to_string(),
        time_of_day: time_of_day.to_string(),
        duration_minutes: 60,
        messaging_group_id: Some("group-1".to_string()),
        host_identity: "host@classline.test".to_string(),
        active: true,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
