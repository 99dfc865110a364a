//! Integration tests for the SQLite repositories.

mod support;

use chrono::{NaiveTime, Utc};
use classline_core::{AutomationLog, MeetingRepository, OccurrenceRepository, TemplateRepository};
use classline_domain::{
    AutomationLogEntry, ClasslineError, CourseLevel, MeetingRecord, OccurrenceStatus,
    OccurrenceWrite, TemplateRow, WindowChanges,
};
use classline_infra::database::{
    SqliteAutomationLog, SqliteMeetingRepository, SqliteOccurrenceRepository,
    SqliteTemplateRepository,
};
use serde_json::json;
use support::{date, seed_template, TestDatabase};
use uuid::Uuid;

fn occurrence_write(template: &TemplateRow, y: i32, m: u32, d: u32) -> OccurrenceWrite {
    OccurrenceWrite {
        id: Uuid::new_v4(),
        template_id: template.id,
        course_name: template.course_name.clone(),
        level: CourseLevel::Intermediate,
        teacher_name: template.teacher_name.clone(),
        duration_minutes: template.duration_minutes,
        messaging_group_id: template.messaging_group_id.clone(),
        scheduled_date: date(y, m, d),
        scheduled_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
    }
}

fn meeting_record(template_id: Uuid) -> MeetingRecord {
    MeetingRecord {
        id: Uuid::new_v4(),
        template_id,
        external_meeting_id: "9001".to_string(),
        join_url: "https://meet.example.test/j/9001".to_string(),
        first_occurrence_start: date(2024, 1, 9).and_time(NaiveTime::from_hms_opt(20, 0, 0).unwrap()),
        provider_status: "waiting".to_string(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn templates_round_trip_and_filter_on_active() {
    let db = TestDatabase::new();
    let repo = SqliteTemplateRepository::new(db.manager.clone());

    let first = seed_template(&db, "monday", "20:30", "host-a@classline.test");
    let second = seed_template(&db, "tuesday", "19:00", "host-b@classline.test");

    let active = repo.list_active().await.expect("list");
    assert_eq!(active.len(), 2);

    repo.set_active(second.id, false).expect("deactivate");
    let active = repo.list_active().await.expect("list");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, first.id);

    let found = repo.find(second.id).await.expect("find").expect("row");
    assert!(!found.active);
    assert_eq!(found.day_of_week, "tuesday");
    assert_eq!(found.time_of_day, "19:00");

    assert!(repo.find(Uuid::new_v4()).await.expect("find").is_none());
}

#[tokio::test]
async fn set_active_on_unknown_template_is_not_found() {
    let db = TestDatabase::new();
    let repo = SqliteTemplateRepository::new(db.manager.clone());

    let err = repo.set_active(Uuid::new_v4(), false).unwrap_err();
    assert!(matches!(err, ClasslineError::NotFound(_)));
}

#[tokio::test]
async fn apply_window_inserts_pending_occurrences() {
    let db = TestDatabase::new();
    let template = seed_template(&db, "tuesday", "20:00", "host@classline.test");
    let repo = SqliteOccurrenceRepository::new(db.manager.clone());

    let write = occurrence_write(&template, 2024, 1, 9);
    repo.apply_window(WindowChanges { upserts: vec![write.clone()], deletes: vec![] })
        .await
        .expect("apply");

    let window = repo.find_window(date(2024, 1, 8)).await.expect("window");
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].id, write.id);
    assert_eq!(window[0].status, OccurrenceStatus::Pending);
    assert!(window[0].meeting_id.is_none());
    assert_eq!(window[0].scheduled_time, write.scheduled_time);
}

#[tokio::test]
async fn upsert_rewrites_in_place_keeping_id_and_created_at() {
    let db = TestDatabase::new();
    let template = seed_template(&db, "tuesday", "20:00", "host@classline.test");
    let repo = SqliteOccurrenceRepository::new(db.manager.clone());

    let mut write = occurrence_write(&template, 2024, 1, 9);
    repo.apply_window(WindowChanges { upserts: vec![write.clone()], deletes: vec![] })
        .await
        .expect("first apply");
    let before = repo.find_by_id(write.id).await.expect("find").expect("row");

    write.scheduled_time = NaiveTime::from_hms_opt(21, 30, 0).unwrap();
    write.teacher_name = "Lucia".to_string();
    repo.apply_window(WindowChanges { upserts: vec![write.clone()], deletes: vec![] })
        .await
        .expect("second apply");

    let after = repo.find_by_id(write.id).await.expect("find").expect("row");
    assert_eq!(after.id, before.id);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.scheduled_time, NaiveTime::from_hms_opt(21, 30, 0).unwrap());
    assert_eq!(after.teacher_name, "Lucia");
}

#[tokio::test]
async fn upsert_resets_link_and_status() {
    let db = TestDatabase::new();
    let template = seed_template(&db, "tuesday", "20:00", "host@classline.test");
    let occurrences = SqliteOccurrenceRepository::new(db.manager.clone());
    let meetings = SqliteMeetingRepository::new(db.manager.clone());

    let write = occurrence_write(&template, 2024, 1, 9);
    occurrences
        .apply_window(WindowChanges { upserts: vec![write.clone()], deletes: vec![] })
        .await
        .expect("apply");

    let record = meeting_record(template.id);
    meetings.insert(&record).await.expect("meeting insert");
    occurrences.link_meeting(write.id, record.id).await.expect("link");

    let linked = occurrences.find_by_id(write.id).await.expect("find").expect("row");
    assert_eq!(linked.status, OccurrenceStatus::Scheduled);
    assert_eq!(linked.meeting_id, Some(record.id));

    occurrences
        .apply_window(WindowChanges { upserts: vec![write.clone()], deletes: vec![] })
        .await
        .expect("re-apply");

    let reset = occurrences.find_by_id(write.id).await.expect("find").expect("row");
    assert_eq!(reset.status, OccurrenceStatus::Pending);
    assert!(reset.meeting_id.is_none());
}

#[tokio::test]
async fn apply_window_deletes_rows() {
    let db = TestDatabase::new();
    let template = seed_template(&db, "tuesday", "20:00", "host@classline.test");
    let repo = SqliteOccurrenceRepository::new(db.manager.clone());

    let write = occurrence_write(&template, 2024, 1, 9);
    repo.apply_window(WindowChanges { upserts: vec![write.clone()], deletes: vec![] })
        .await
        .expect("apply");
    repo.apply_window(WindowChanges { upserts: vec![], deletes: vec![write.id] })
        .await
        .expect("delete");

    assert!(repo.find_by_id(write.id).await.expect("find").is_none());
}

#[tokio::test]
async fn mark_failed_and_not_found_paths() {
    let db = TestDatabase::new();
    let template = seed_template(&db, "tuesday", "20:00", "host@classline.test");
    let repo = SqliteOccurrenceRepository::new(db.manager.clone());

    let write = occurrence_write(&template, 2024, 1, 9);
    repo.apply_window(WindowChanges { upserts: vec![write.clone()], deletes: vec![] })
        .await
        .expect("apply");

    repo.mark_failed(write.id).await.expect("mark failed");
    let row = repo.find_by_id(write.id).await.expect("find").expect("row");
    assert_eq!(row.status, OccurrenceStatus::Failed);

    let err = repo.mark_failed(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ClasslineError::NotFound(_)));
    let err = repo.link_meeting(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ClasslineError::NotFound(_)));
}

#[tokio::test]
async fn range_listing_orders_by_date_then_time() {
    let db = TestDatabase::new();
    let template = seed_template(&db, "tuesday", "20:00", "host@classline.test");
    let repo = SqliteOccurrenceRepository::new(db.manager.clone());

    let mut early = occurrence_write(&template, 2024, 1, 10);
    early.scheduled_time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let mut late = occurrence_write(&template, 2024, 1, 10);
    late.scheduled_date = date(2024, 1, 11);
    let first = occurrence_write(&template, 2024, 1, 9);

    repo.apply_window(WindowChanges {
        upserts: vec![late.clone(), early.clone(), first.clone()],
        deletes: vec![],
    })
    .await
    .expect("apply");

    let listed = repo.list_in_range(date(2024, 1, 8), date(2024, 1, 15)).await.expect("list");
    let ids: Vec<_> = listed.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![first.id, early.id, late.id]);

    let partial = repo.list_in_range(date(2024, 1, 8), date(2024, 1, 11)).await.expect("list");
    assert_eq!(partial.len(), 2);
}

#[tokio::test]
async fn second_meeting_for_template_is_a_conflict() {
    let db = TestDatabase::new();
    let template = seed_template(&db, "tuesday", "20:00", "host@classline.test");
    let repo = SqliteMeetingRepository::new(db.manager.clone());

    let record = meeting_record(template.id);
    repo.insert(&record).await.expect("first insert");

    let duplicate = meeting_record(template.id);
    let err = repo.insert(&duplicate).await.unwrap_err();
    assert!(matches!(err, ClasslineError::Conflict(_)));

    let found = repo.find_by_template(template.id).await.expect("find").expect("record");
    assert_eq!(found.id, record.id);
    assert_eq!(found.external_meeting_id, "9001");
    assert_eq!(found.first_occurrence_start, record.first_occurrence_start);

    let by_id = repo.find_by_id(record.id).expect("find by id").expect("record");
    assert_eq!(by_id.template_id, template.id);

    assert!(repo.find_by_template(Uuid::new_v4()).await.expect("find").is_none());
    assert!(repo.find_by_id(Uuid::new_v4()).expect("find by id").is_none());
}

#[tokio::test]
async fn automation_log_appends_and_lists_recent() {
    let db = TestDatabase::new();
    let template = seed_template(&db, "tuesday", "20:00", "host@classline.test");
    let log = SqliteAutomationLog::new(db.manager.clone());

    log.append(AutomationLogEntry::success(
        "meeting_sync",
        "meeting created",
        json!({"meeting_id": "9001"}),
        Some(template.id),
    ))
    .await
    .expect("append success");

    log.append(AutomationLogEntry::error(
        "meeting_sync",
        "provider unavailable",
        json!({"status": 502}),
        Some(template.id),
    ))
    .await
    .expect("append error");

    let recent = log.list_recent(10).expect("list");
    assert_eq!(recent.len(), 2);
    assert!(recent.iter().any(|e| e.message == "meeting created"));
    assert!(recent.iter().any(|e| e.message == "provider unavailable"));
    assert!(recent.iter().all(|e| e.kind == "meeting_sync"));
    assert!(recent.iter().all(|e| e.related_template_id == Some(template.id)));

    let limited = log.list_recent(1).expect("list");
    assert_eq!(limited.len(), 1);
}
