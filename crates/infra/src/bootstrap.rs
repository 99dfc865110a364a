//! Application bootstrap.
//!
//! Wires the SQLite repositories, provider client and core services into
//! a ready [`SchedulingEngine`].

use std::str::FromStr;
use std::sync::Arc;

use chrono_tz::Tz;
use classline_core::{MaterializerService, SchedulingEngine, SyncService, SystemClock};
use classline_domain::{ClasslineError, Config, Result};
use tracing::info;

use crate::database::{
    DbManager, SqliteAutomationLog, SqliteMeetingRepository, SqliteOccurrenceRepository,
    SqliteTemplateRepository,
};
use crate::http::HttpClient;
use crate::provider::{MeetingApiClient, TokenCache};

/// Fully wired application: the engine plus the shared database handle.
pub struct App {
    pub engine: SchedulingEngine,
    pub db: Arc<DbManager>,
}

impl App {
    /// Build the application from configuration, running migrations on
    /// the way up.
    pub fn build(config: &Config) -> Result<Self> {
        let timezone = Tz::from_str(&config.scheduling.timezone).map_err(|_| {
            ClasslineError::Config(format!(
                "unknown reference timezone: {}",
                config.scheduling.timezone
            ))
        })?;

        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let templates = Arc::new(SqliteTemplateRepository::new(db.clone()));
        let occurrences = Arc::new(SqliteOccurrenceRepository::new(db.clone()));
        let meetings = Arc::new(SqliteMeetingRepository::new(db.clone()));
        let log = Arc::new(SqliteAutomationLog::new(db.clone()));

        let http = HttpClient::builder().user_agent("classline").build()?;
        let tokens = Arc::new(TokenCache::new(http.clone(), config.provider.clone()));
        let provider = Arc::new(MeetingApiClient::new(
            http,
            tokens,
            config.provider.api_base_url.clone(),
            config.scheduling.timezone.clone(),
        ));

        let materializer =
            Arc::new(MaterializerService::new(templates.clone(), occurrences.clone()));
        let sync = Arc::new(SyncService::new(
            occurrences.clone(),
            templates,
            meetings,
            provider,
            log,
            Arc::new(SystemClock),
            timezone,
            config.scheduling.bulk_parallelism,
        ));

        info!(timezone = %config.scheduling.timezone, "scheduling engine wired");

        Ok(Self { engine: SchedulingEngine::new(materializer, sync, occurrences), db })
    }
}
