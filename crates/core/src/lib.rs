//! # Classline Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The time window expander (pure date arithmetic)
//! - The occurrence materializer and meeting synchronizer services
//! - Port/adapter interfaces (traits)
//! - The scheduling engine facade exposed to collaborators
//!
//! ## Architecture Principles
//! - Only depends on `classline-domain`
//! - No database or HTTP code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod clock;
pub mod engine;
pub mod expansion;
mod lock_map;
pub mod materializer;
pub mod ports;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::SchedulingEngine;
pub use materializer::MaterializerService;
pub use ports::{
    AutomationLog, MeetingProvider, MeetingRepository, OccurrenceRepository, TemplateRepository,
};
pub use sync::{SyncAction, SyncService};
