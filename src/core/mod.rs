//! Core engine
//!
//! Profiles, the move engine, session statistics and the monitoring session

pub mod events;
pub mod profile;
pub mod profile_store;
pub mod stats;
pub mod mover;
pub mod session;

// Re-export main types
pub use events::{EngineEvent, EventLog, FileEvent, FileEventKind, DEFAULT_MAX_EVENTS};
pub use profile::{normalize_extension, Profile};
pub use profile_store::{ProfileStore, KEY_ACTIVE_PROFILE_ID, KEY_SAVED_PROFILES};
pub use stats::{format_duration, SessionStatistics};
pub use mover::{resolve_conflict, MoveOutcome, Mover};
pub use session::{MonitorSession, SessionOptions, StartOutcome, TickSummary};
