//! Time window expansion - pure date arithmetic
//!
//! Maps a weekly course template onto concrete dates. No I/O, fully
//! deterministic; every scheduling decision that involves a calendar lives
//! here so it can be unit tested in isolation.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use classline_domain::CourseTemplate;

/// One expanded occurrence candidate within a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedOccurrence {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// The Monday on or before the given date.
#[must_use]
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Expand a template into its single occurrence within the half-open
/// window `[week_start, week_end)`.
///
/// Returns `None` when the window is shorter than a week and misses the
/// template's weekday. The occurrence end is `start + duration`.
#[must_use]
pub fn expand(
    template: &CourseTemplate,
    week_start: NaiveDate,
    week_end: NaiveDate,
) -> Option<ExpandedOccurrence> {
    let date = next_date_on_weekday(week_start, template.day_of_week);
    if date >= week_end {
        return None;
    }

    let start = date.and_time(template.time_of_day);
    let end = start + Duration::minutes(template.duration_minutes);
    Some(ExpandedOccurrence { date, start, end })
}

/// The next future instant matching the weekday and time, relative to
/// `now_local` in the reference timezone.
///
/// When today's slot has already passed (or is exactly now), the result
/// rolls forward exactly seven days. The offset is never zero-in-the-past
/// and never negative.
#[must_use]
pub fn first_future_start(
    weekday: Weekday,
    time_of_day: NaiveTime,
    now_local: NaiveDateTime,
) -> NaiveDateTime {
    let candidate = next_date_on_weekday(now_local.date(), weekday).and_time(time_of_day);
    if candidate <= now_local {
        candidate + Duration::days(7)
    } else {
        candidate
    }
}

/// First date on or after `from` that falls on `weekday`.
fn next_date_on_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let offset = (i64::from(weekday.num_days_from_monday())
        - i64::from(from.weekday().num_days_from_monday()))
    .rem_euclid(7);
    from + Duration::days(offset)
}
