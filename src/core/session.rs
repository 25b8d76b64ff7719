//! The monitoring session
//!
//! Owns everything that changes while monitoring: the profile snapshot,
//! the last-seen listing, statistics, the recent event list and the latest
//! error. All mutation happens through `start`, `stop`, `tick` and the
//! reset calls, which the host serialises on one thread.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;
use chrono::Utc;
use super::events::{EngineEvent, EventLog, FileEvent, DEFAULT_MAX_EVENTS};
use super::mover::{MoveOutcome, Mover};
use super::profile::Profile;
use super::stats::SessionStatistics;
use crate::config::{Settings, MAX_RECENT_EVENTS, MIN_RECENT_EVENTS};
use crate::notifier::Notifier;
use crate::watcher::{list_files, new_entries};

/// Engine knobs derived from [`Settings`]
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub poll_interval: Duration,
    pub max_events: usize,
    pub resolve_conflicts: bool,
    pub notifications_enabled: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_events: DEFAULT_MAX_EVENTS,
            resolve_conflicts: true,
            notifications_enabled: true,
        }
    }
}

impl From<&Settings> for SessionOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.check_interval_duration(),
            max_events: settings
                .max_recent_events
                .clamp(MIN_RECENT_EVENTS, MAX_RECENT_EVENTS),
            resolve_conflicts: settings.enable_file_conflict_resolution,
            notifications_enabled: settings.enable_notifications,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    /// The profile failed validation; see [`MonitorSession::error_message`].
    InvalidProfile,
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub detected: usize,
    pub moved: usize,
    pub failed: usize,
    pub ignored: usize,
    /// The listing failed; nothing was processed.
    pub scan_failed: bool,
}

struct ActiveSession {
    profile: Profile,
    /// Fixed at start; settings changes apply from the next start.
    interval: Duration,
    /// `None` until a baseline listing succeeds.
    last_seen: Option<HashSet<PathBuf>>,
}

pub struct MonitorSession {
    options: SessionOptions,
    mover: Mover,
    notifier: Box<dyn Notifier>,
    active: Option<ActiveSession>,
    statistics: SessionStatistics,
    events: EventLog,
    error_message: Option<String>,
    observers: Vec<Sender<EngineEvent>>,
}

impl MonitorSession {
    pub fn new(notifier: Box<dyn Notifier>, options: SessionOptions) -> Self {
        Self {
            mover: Mover::new(options.resolve_conflicts),
            events: EventLog::with_capacity(options.max_events),
            options,
            notifier,
            active: None,
            statistics: SessionStatistics::default(),
            error_message: None,
            observers: Vec::new(),
        }
    }

    /// Register an observer. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    pub(crate) fn emit(&mut self, event: EngineEvent) {
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Takes effect at the next `start`, except notifications which apply
    /// immediately.
    pub fn set_options(&mut self, options: SessionOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn is_monitoring(&self) -> bool {
        self.active.is_some()
    }

    pub fn current_profile(&self) -> Option<&Profile> {
        self.active.as_ref().map(|a| &a.profile)
    }

    /// Tick interval of the running session.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.active.as_ref().map(|a| a.interval)
    }

    pub fn statistics(&self) -> &SessionStatistics {
        &self.statistics
    }

    pub fn recent_events(&self) -> &EventLog {
        &self.events
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn start(&mut self, profile: &Profile) -> StartOutcome {
        if self.active.is_some() {
            tracing::warn!("Already monitoring, ignoring start request");
            return StartOutcome::AlreadyRunning;
        }

        if let Err(err) = profile.validate() {
            tracing::error!("Refusing to start '{}': {}", profile.display_name(), err);
            self.set_error(Some(err.to_string()));
            return StartOutcome::InvalidProfile;
        }

        let now = Utc::now();
        let mut snapshot = profile.clone();
        snapshot.last_used_date = now;

        tracing::info!(
            "Monitoring '{}': {} -> {} ({})",
            snapshot.display_name(),
            snapshot.watch_folder.display(),
            snapshot.destination_folder.display(),
            snapshot.extensions_text()
        );

        let last_seen = match list_files(&snapshot.watch_folder) {
            Ok(files) => {
                tracing::debug!("Baseline: {} existing files", files.len());
                Some(files.into_iter().collect())
            }
            Err(err) => {
                tracing::warn!("Baseline listing failed, deferring to first tick: {}", err);
                None
            }
        };

        self.mover = Mover::new(self.options.resolve_conflicts);
        if self.events.max_events() != self.options.max_events {
            self.events.resize(self.options.max_events);
        }

        self.statistics.reset();
        self.statistics.session_start_time = Some(now);
        self.active = Some(ActiveSession {
            profile: snapshot,
            interval: self.options.poll_interval,
            last_seen,
        });

        self.set_error(None);
        self.emit(EngineEvent::MonitoringToggled(true));
        self.emit(EngineEvent::StatisticsUpdated);
        StartOutcome::Started
    }

    /// Safe to call when idle.
    pub fn stop(&mut self) {
        let was_running = self.active.take().is_some();
        self.statistics.session_start_time = None;
        self.set_error(None);

        if was_running {
            tracing::info!("Monitoring stopped");
            self.emit(EngineEvent::MonitoringToggled(false));
            self.emit(EngineEvent::StatisticsUpdated);
        }
    }

    /// One scan of the watch folder. New files are handed to the mover one
    /// at a time, in listing order.
    pub fn tick(&mut self) -> TickSummary {
        let mut summary = TickSummary::default();

        let (profile, new_paths) = {
            let active = match self.active.as_mut() {
                Some(active) => active,
                None => return summary,
            };

            let current = match list_files(&active.profile.watch_folder) {
                Ok(files) => files,
                Err(err) => {
                    tracing::warn!(
                        "Error checking for new files in {}: {}",
                        active.profile.watch_folder.display(),
                        err
                    );
                    summary.scan_failed = true;
                    return summary;
                }
            };

            let new_paths = match &active.last_seen {
                Some(previous) => new_entries(&current, previous),
                None => {
                    tracing::debug!("Baseline established on first tick: {} files", current.len());
                    Vec::new()
                }
            };
            active.last_seen = Some(current.into_iter().collect());
            (active.profile.clone(), new_paths)
        };

        summary.detected = new_paths.len();
        if !new_paths.is_empty() {
            tracing::debug!("Detected {} new files", new_paths.len());
        }

        for path in new_paths {
            let outcome = self.mover.handle(&path, &profile);
            self.record(outcome, &mut summary);
        }

        summary
    }

    pub fn reset_statistics(&mut self) {
        let start = self.statistics.session_start_time;
        self.statistics.reset();
        // A running session keeps its clock.
        if self.active.is_some() {
            self.statistics.session_start_time = start;
        }
        self.events.clear();
        self.emit(EngineEvent::StatisticsUpdated);
        self.emit(EngineEvent::EventsCleared);
    }

    pub fn clear_recent_events(&mut self) {
        self.events.clear();
        self.emit(EngineEvent::EventsCleared);
    }

    fn record(&mut self, outcome: MoveOutcome, summary: &mut TickSummary) {
        match outcome {
            MoveOutcome::Ignored => summary.ignored += 1,
            MoveOutcome::Moved {
                source,
                destination,
                extension,
            } => {
                summary.moved += 1;
                let event = FileEvent::moved(destination);
                self.statistics.record_move(&extension, event.timestamp);
                self.push_event(event);
                self.emit(EngineEvent::StatisticsUpdated);

                let name = display_file_name(&source);
                self.send_notification("File Moved", &format!("{} moved successfully", name));
            }
            MoveOutcome::Failed { source, error } => {
                summary.failed += 1;
                let name = display_file_name(&source);
                let description = error.to_string();

                self.statistics.record_error();
                self.push_event(FileEvent::failed(source, description.clone()));
                self.emit(EngineEvent::StatisticsUpdated);
                self.set_error(Some(format!("Failed to move {}: {}", name, description)));

                self.send_notification("Move Failed", &format!("Failed to move {}", name));
            }
        }
    }

    fn push_event(&mut self, event: FileEvent) {
        self.events.push(event.clone());
        self.emit(EngineEvent::EventAppended(event));
    }

    fn set_error(&mut self, message: Option<String>) {
        if self.error_message != message {
            self.error_message = message.clone();
            self.emit(EngineEvent::ErrorChanged(message));
        }
    }

    fn send_notification(&self, title: &str, body: &str) {
        if self.options.notifications_enabled {
            self.notifier.notify(title, body);
        }
    }
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
