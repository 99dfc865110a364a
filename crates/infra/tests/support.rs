//! Shared helpers for infrastructure integration tests.

use std::sync::Arc;

use chrono::NaiveDate;
use classline_domain::TemplateRow;
use classline_infra::database::{DbManager, SqliteTemplateRepository};
use tempfile::TempDir;
use uuid::Uuid;

/// Temporary database that keeps the underlying file alive for the
/// duration of a test.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a migrated temporary database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("classline.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("migrations should run");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a template row for the given weekday/time with test defaults.
pub fn template_row(day_of_week: &str, time_of_day: &str, host: &str) -> TemplateRow {
    TemplateRow {
        id: Uuid::new_v4(),
        course_name: "Conversation B2".to_string(),
        level_code: "int".to_string(),
        teacher_name: "Marta".to_string(),
        day_of_week: day_of_week.to_string(),
        time_of_day: time_of_day.to_string(),
        duration_minutes: 60,
        messaging_group_id: Some("group-1".to_string()),
        host_identity: host.to_string(),
        active: true,
    }
}

/// Insert a template row and return it.
pub fn seed_template(
    db: &TestDatabase,
    day_of_week: &str,
    time_of_day: &str,
    host: &str,
) -> TemplateRow {
    let row = template_row(day_of_week, time_of_day, host);
    let repo = SqliteTemplateRepository::new(db.manager.clone());
    repo.insert(&row).expect("template should insert");
    row
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Install a test subscriber honoring `RUST_LOG`; safe to call from every
/// test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
