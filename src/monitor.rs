//! Application object tying storage, settings, profiles and the session
//! together. The host constructs one and owns it.

use std::sync::mpsc::Receiver;
use uuid::Uuid;
use crate::config::Settings;
use crate::core::{
    EngineEvent, EventLog, MonitorSession, Profile, ProfileStore, SessionOptions,
    SessionStatistics, StartOutcome, TickSummary,
};
use crate::error::{MonitorError, Result};
use crate::notifier::Notifier;
use crate::store::KeyValueStore;

pub struct Monitor {
    store: Box<dyn KeyValueStore>,
    profiles: ProfileStore,
    /// As stored; environment overrides are never folded in.
    settings: Settings,
    env_overrides: bool,
    session: MonitorSession,
}

impl Monitor {
    /// Load profiles and settings from `store`.
    pub fn open(store: Box<dyn KeyValueStore>, notifier: Box<dyn Notifier>) -> Self {
        let settings = Settings::load(&*store);
        Self::with_settings(store, settings, notifier)
    }

    /// Like [`Monitor::open`] with explicitly supplied settings.
    pub fn with_settings(
        store: Box<dyn KeyValueStore>,
        settings: Settings,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let profiles = ProfileStore::load(&*store);
        let session = MonitorSession::new(notifier, SessionOptions::from(&settings));

        Self {
            store,
            profiles,
            settings,
            env_overrides: false,
            session,
        }
    }

    /// Let `FOLDER_MONITOR_*` variables override what the engine runs with.
    /// Saved settings are unaffected.
    pub fn with_env_overrides(mut self) -> Self {
        self.env_overrides = true;
        self.session.set_options(SessionOptions::from(&self.effective_settings()));
        self
    }

    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        self.session.subscribe()
    }

    pub fn profiles(&self) -> &[Profile] {
        self.profiles.list()
    }

    pub fn find_profile(&self, key: &str) -> Result<&Profile> {
        self.profiles
            .find(key)
            .ok_or_else(|| MonitorError::ProfileNotFound(key.to_string()))
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.profiles.get_active()
    }

    pub fn add_profile(&mut self, profile: Profile) {
        self.profiles.add(&mut *self.store, profile);
        self.session.emit(EngineEvent::ProfilesChanged);
    }

    pub fn update_profile(&mut self, profile: Profile) -> bool {
        let updated = self.profiles.update(&mut *self.store, profile);
        if updated {
            self.session.emit(EngineEvent::ProfilesChanged);
        }
        updated
    }

    pub fn delete_profile(&mut self, id: Uuid) -> bool {
        let was_active = self.profiles.active_id() == Some(id);
        let removed = self.profiles.delete(&mut *self.store, id);
        if removed {
            self.session.emit(EngineEvent::ProfilesChanged);
        }
        if was_active {
            self.session.emit(EngineEvent::ActiveProfileChanged(None));
        }
        removed
    }

    pub fn set_active_profile(&mut self, id: Uuid) -> Result<()> {
        if !self.profiles.set_active(&mut *self.store, id) {
            return Err(MonitorError::ProfileNotFound(id.to_string()));
        }
        self.session.emit(EngineEvent::ActiveProfileChanged(Some(id)));
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Stored settings with any environment overrides applied.
    pub fn effective_settings(&self) -> Settings {
        if self.env_overrides {
            self.settings.clone().with_env_overrides()
        } else {
            self.settings.clone()
        }
    }

    /// Assign fields here, then call [`Monitor::save_settings`].
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Validate and persist the current settings. The session picks them
    /// up on its next start.
    pub fn save_settings(&mut self) -> anyhow::Result<()> {
        self.settings.validate()?;
        self.settings.save(&mut *self.store)?;
        self.session.set_options(SessionOptions::from(&self.effective_settings()));
        Ok(())
    }

    pub fn reset_settings(&mut self) -> anyhow::Result<()> {
        self.settings.reset_to_defaults(&mut *self.store)?;
        self.session.set_options(SessionOptions::from(&self.effective_settings()));
        Ok(())
    }

    /// Start monitoring the active profile.
    pub fn start(&mut self) -> Result<StartOutcome> {
        let profile = self
            .profiles
            .get_active()
            .cloned()
            .ok_or(MonitorError::NoActiveProfile)?;

        let outcome = self.session.start(&profile);
        if outcome == StartOutcome::Started {
            if let Some(snapshot) = self.session.current_profile().cloned() {
                if self.profiles.update(&mut *self.store, snapshot) {
                    self.session.emit(EngineEvent::ProfilesChanged);
                }
            }
        }
        Ok(outcome)
    }

    pub fn stop(&mut self) {
        self.session.stop();
    }

    pub fn tick(&mut self) -> TickSummary {
        self.session.tick()
    }

    pub fn is_monitoring(&self) -> bool {
        self.session.is_monitoring()
    }

    pub fn session(&self) -> &MonitorSession {
        &self.session
    }

    pub fn statistics(&self) -> &SessionStatistics {
        self.session.statistics()
    }

    pub fn recent_events(&self) -> &EventLog {
        self.session.recent_events()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.session.error_message()
    }

    pub fn reset_statistics(&mut self) {
        self.session.reset_statistics();
    }

    pub fn clear_recent_events(&mut self) {
        self.session.clear_recent_events();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::LogNotifier;
    use crate::config::KEY_MAX_RECENT_EVENTS;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn monitor() -> Monitor {
        Monitor::open(Box::new(MemoryStore::new()), Box::new(LogNotifier))
    }

    #[test]
    fn test_start_without_active_profile() {
        let mut monitor = monitor();
        assert!(matches!(monitor.start(), Err(MonitorError::NoActiveProfile)));
        assert!(!monitor.is_monitoring());
    }

    #[test]
    fn test_start_refreshes_stored_last_used() {
        let temp_dir = TempDir::new().unwrap();
        let watch = temp_dir.path().join("in");
        let dest = temp_dir.path().join("out");
        fs::create_dir(&watch).unwrap();
        fs::create_dir(&dest).unwrap();

        let mut monitor = monitor();
        let mut profile = Profile::new("P", &watch, &dest);
        profile.last_used_date = profile.last_used_date - chrono::Duration::hours(5);
        let before = profile.last_used_date;
        let id = profile.id;
        monitor.add_profile(profile);
        monitor.set_active_profile(id).unwrap();

        assert_eq!(monitor.start().unwrap(), StartOutcome::Started);
        assert!(monitor.active_profile().unwrap().last_used_date > before);
    }

    #[test]
    fn test_profile_commands_notify_observers() {
        let mut monitor = monitor();
        let rx = monitor.subscribe();
        let profile = Profile::new("P", "/in", "/out");
        let id = profile.id;

        monitor.add_profile(profile);
        monitor.set_active_profile(id).unwrap();
        monitor.delete_profile(id);

        let events: Vec<EngineEvent> = rx.try_iter().collect();
        assert!(matches!(events[0], EngineEvent::ProfilesChanged));
        assert!(matches!(events[1], EngineEvent::ActiveProfileChanged(Some(_))));
        assert!(matches!(events[2], EngineEvent::ProfilesChanged));
        assert!(matches!(events[3], EngineEvent::ActiveProfileChanged(None)));
    }

    #[test]
    fn test_set_active_unknown_profile() {
        let mut monitor = monitor();
        assert!(matches!(
            monitor.set_active_profile(Uuid::new_v4()),
            Err(MonitorError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_save_settings_validates() {
        let mut monitor = monitor();
        monitor.settings_mut().check_interval = 10.0;
        assert!(monitor.save_settings().is_err());

        monitor.settings_mut().check_interval = 2.0;
        monitor.settings_mut().max_recent_events = 20;
        monitor.save_settings().unwrap();
        assert_eq!(monitor.session().options().max_events, 20);

        monitor.reset_settings().unwrap();
        assert_eq!(monitor.settings(), &Settings::default());
    }

    #[test]
    fn test_env_overrides_are_not_saved() {
        std::env::set_var("FOLDER_MONITOR_MAX_RECENT_EVENTS", "20");
        let mut monitor = monitor().with_env_overrides();
        assert_eq!(monitor.session().options().max_events, 20);

        monitor.settings_mut().show_in_menu_bar = false;
        monitor.save_settings().unwrap();
        assert_eq!(monitor.store.get(KEY_MAX_RECENT_EVENTS), Some(json!(50)));
        assert_eq!(monitor.settings().max_recent_events, 50);
        assert_eq!(monitor.effective_settings().max_recent_events, 20);

        // Out of range for validation, but only the stored values are checked.
        std::env::set_var("FOLDER_MONITOR_MAX_RECENT_EVENTS", "500");
        monitor.settings_mut().check_interval = 2.0;
        let saved = monitor.save_settings();
        std::env::remove_var("FOLDER_MONITOR_MAX_RECENT_EVENTS");

        saved.unwrap();
        assert_eq!(monitor.session().options().max_events, 50);
        assert_eq!(monitor.store.get(KEY_MAX_RECENT_EVENTS), Some(json!(50)));
    }
}
