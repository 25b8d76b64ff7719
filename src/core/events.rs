use std::collections::VecDeque;
use std::path::PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default and upper bound of the recent event list.
pub const DEFAULT_MAX_EVENTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileEventKind {
    Created,
    Moved,
    Error,
}

impl FileEventKind {
    pub fn label(&self) -> &'static str {
        match self {
            FileEventKind::Created => "Created",
            FileEventKind::Moved => "Moved",
            FileEventKind::Error => "Error",
        }
    }
}

/// Outcome of one detection attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl FileEvent {
    pub fn moved(destination: PathBuf) -> Self {
        Self {
            path: destination,
            kind: FileEventKind::Moved,
            timestamp: Utc::now(),
            success: true,
            error_message: None,
        }
    }

    pub fn failed(source: PathBuf, error: impl Into<String>) -> Self {
        Self {
            path: source,
            kind: FileEventKind::Error,
            timestamp: Utc::now(),
            success: false,
            error_message: Some(error.into()),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Newest-first list of recent events, bounded to `max_events`, which
/// itself never exceeds [`DEFAULT_MAX_EVENTS`].
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<FileEvent>,
    max_events: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_EVENTS)
    }
}

impl EventLog {
    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(clamp_cap(max_events)),
            max_events: clamp_cap(max_events),
        }
    }

    /// Change the cap, dropping the oldest entries that no longer fit.
    pub fn resize(&mut self, max_events: usize) {
        self.max_events = clamp_cap(max_events);
        self.events.truncate(self.max_events);
    }

    pub fn push(&mut self, event: FileEvent) {
        self.events.push_front(event);
        while self.events.len() > self.max_events {
            self.events.pop_back();
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn max_events(&self) -> usize {
        self.max_events
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &FileEvent> {
        self.events.iter()
    }

    pub fn latest(&self) -> Option<&FileEvent> {
        self.events.front()
    }
}

fn clamp_cap(max_events: usize) -> usize {
    max_events.clamp(1, DEFAULT_MAX_EVENTS)
}

/// State-change notifications delivered to observers
#[derive(Debug, Clone)]
pub enum EngineEvent {
    ProfilesChanged,
    ActiveProfileChanged(Option<Uuid>),
    MonitoringToggled(bool),
    StatisticsUpdated,
    EventAppended(FileEvent),
    EventsCleared,
    ErrorChanged(Option<String>),
}
