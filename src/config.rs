//! Settings management for Folder Monitor
//!
//! Settings live in the shared key-value store, one key per field. Missing
//! or ill-typed keys fall back to their defaults. Changes are made by
//! assigning fields directly and calling [`Settings::save`].

use std::time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use crate::core::DEFAULT_MAX_EVENTS;
use crate::error::{MonitorError, Result};
use crate::store::KeyValueStore;

pub const KEY_ENABLE_NOTIFICATIONS: &str = "enableNotifications";
pub const KEY_SHOW_IN_MENU_BAR: &str = "showInMenuBar";
pub const KEY_AUTO_START_ON_LAUNCH: &str = "autoStartOnLaunch";
pub const KEY_CHECK_INTERVAL: &str = "checkInterval";
pub const KEY_MAX_RECENT_EVENTS: &str = "maxRecentEvents";
pub const KEY_ENABLE_FILE_CONFLICT_RESOLUTION: &str = "enableFileConflictResolution";

pub const MIN_CHECK_INTERVAL_SECS: f64 = 0.5;
pub const MAX_CHECK_INTERVAL_SECS: f64 = 5.0;
pub const MIN_RECENT_EVENTS: usize = 10;
/// The recent event list never grows past this; the setting can only lower it.
pub const MAX_RECENT_EVENTS: usize = DEFAULT_MAX_EVENTS;

/// User-tunable settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Send a notification for every move outcome
    pub enable_notifications: bool,
    /// Only meaningful to a menu-bar host; stored and displayed
    pub show_in_menu_bar: bool,
    /// Start monitoring the active profile when the binary runs without a command
    pub auto_start_on_launch: bool,
    /// Seconds between directory scans
    pub check_interval: f64,
    /// Cap on the recent event list
    pub max_recent_events: usize,
    /// Rename on name collision instead of failing the move
    pub enable_file_conflict_resolution: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_notifications: true,
            show_in_menu_bar: true,
            auto_start_on_launch: false,
            check_interval: 1.0,
            max_recent_events: 50,
            enable_file_conflict_resolution: true,
        }
    }
}

fn stored_bool(store: &dyn KeyValueStore, key: &str, default: bool) -> bool {
    store.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

impl Settings {
    /// Load settings from the store
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();

        Self {
            enable_notifications: stored_bool(
                store,
                KEY_ENABLE_NOTIFICATIONS,
                defaults.enable_notifications,
            ),
            show_in_menu_bar: stored_bool(store, KEY_SHOW_IN_MENU_BAR, defaults.show_in_menu_bar),
            auto_start_on_launch: stored_bool(
                store,
                KEY_AUTO_START_ON_LAUNCH,
                defaults.auto_start_on_launch,
            ),
            check_interval: store
                .get(KEY_CHECK_INTERVAL)
                .and_then(|v| v.as_f64())
                .unwrap_or(defaults.check_interval),
            max_recent_events: store
                .get(KEY_MAX_RECENT_EVENTS)
                .and_then(|v| v.as_u64())
                .map(|v| v as usize)
                .unwrap_or(defaults.max_recent_events),
            enable_file_conflict_resolution: stored_bool(
                store,
                KEY_ENABLE_FILE_CONFLICT_RESOLUTION,
                defaults.enable_file_conflict_resolution,
            ),
        }
    }

    /// Persist every field
    pub fn save(&self, store: &mut dyn KeyValueStore) -> anyhow::Result<()> {
        let pairs: [(&str, Value); 6] = [
            (KEY_ENABLE_NOTIFICATIONS, json!(self.enable_notifications)),
            (KEY_SHOW_IN_MENU_BAR, json!(self.show_in_menu_bar)),
            (KEY_AUTO_START_ON_LAUNCH, json!(self.auto_start_on_launch)),
            (KEY_CHECK_INTERVAL, json!(self.check_interval)),
            (KEY_MAX_RECENT_EVENTS, json!(self.max_recent_events)),
            (KEY_ENABLE_FILE_CONFLICT_RESOLUTION, json!(self.enable_file_conflict_resolution)),
        ];

        for (key, value) in pairs {
            store.set(key, value)?;
        }
        Ok(())
    }

    /// Restore defaults and persist them
    pub fn reset_to_defaults(&mut self, store: &mut dyn KeyValueStore) -> anyhow::Result<()> {
        *self = Self::default();
        self.save(store)
    }

    /// Apply environment variable overrides on top of the loaded values.
    /// The result is meant for the running engine, not for saving.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("FOLDER_MONITOR_CHECK_INTERVAL") {
            match val.parse::<f64>() {
                Ok(secs) if secs.is_finite() => self.check_interval = secs,
                _ => tracing::warn!("Ignoring FOLDER_MONITOR_CHECK_INTERVAL={}", val),
            }
        }

        if let Ok(val) = std::env::var("FOLDER_MONITOR_MAX_RECENT_EVENTS") {
            if let Ok(max) = val.parse::<usize>() {
                self.max_recent_events = max;
            }
        }

        if let Ok(val) = std::env::var("FOLDER_MONITOR_NOTIFICATIONS") {
            if let Ok(enabled) = val.parse::<bool>() {
                self.enable_notifications = enabled;
            }
        }

        self
    }

    /// Get the scan interval, clamped to the allowed range
    pub fn check_interval_duration(&self) -> Duration {
        let secs = if self.check_interval.is_finite() {
            self.check_interval
                .clamp(MIN_CHECK_INTERVAL_SECS, MAX_CHECK_INTERVAL_SECS)
        } else {
            Self::default().check_interval
        };
        Duration::from_secs_f64(secs)
    }

    /// Validate setting values
    pub fn validate(&self) -> Result<()> {
        if !(MIN_CHECK_INTERVAL_SECS..=MAX_CHECK_INTERVAL_SECS).contains(&self.check_interval) {
            return Err(MonitorError::InvalidSetting(format!(
                "checkInterval must be between {} and {} seconds",
                MIN_CHECK_INTERVAL_SECS, MAX_CHECK_INTERVAL_SECS
            )));
        }

        if !(MIN_RECENT_EVENTS..=MAX_RECENT_EVENTS).contains(&self.max_recent_events) {
            return Err(MonitorError::InvalidSetting(format!(
                "maxRecentEvents must be between {} and {}",
                MIN_RECENT_EVENTS, MAX_RECENT_EVENTS
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert!(settings.enable_notifications);
        assert!(settings.show_in_menu_bar);
        assert!(!settings.auto_start_on_launch);
        assert_eq!(settings.check_interval, 1.0);
        assert_eq!(settings.max_recent_events, 50);
        assert!(settings.enable_file_conflict_resolution);
    }

    #[test]
    fn test_load_from_empty_store_gives_defaults() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.check_interval = 2.5;
        settings.enable_notifications = false;
        settings.save(&mut store).unwrap();

        assert_eq!(store.get(KEY_CHECK_INTERVAL), Some(json!(2.5)));
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_ill_typed_key_falls_back() {
        let mut store = MemoryStore::new();
        store.set(KEY_MAX_RECENT_EVENTS, json!("lots")).unwrap();
        store.set(KEY_AUTO_START_ON_LAUNCH, json!(true)).unwrap();

        let settings = Settings::load(&store);
        assert_eq!(settings.max_recent_events, 50);
        assert!(settings.auto_start_on_launch);
    }

    #[test]
    fn test_reset_to_defaults_persists() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.max_recent_events = 20;
        settings.save(&mut store).unwrap();

        settings.reset_to_defaults(&mut store).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(Settings::load(&store).max_recent_events, 50);
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.check_interval = 0.1;
        assert!(settings.validate().is_err());

        settings.check_interval = f64::NAN;
        assert!(settings.validate().is_err());

        settings.check_interval = 1.0;
        settings.max_recent_events = 100;
        assert!(settings.validate().is_err());

        settings.max_recent_events = 10;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_duration_conversion() {
        let mut settings = Settings::default();
        assert_eq!(settings.check_interval_duration(), Duration::from_secs(1));

        settings.check_interval = 0.0;
        assert_eq!(settings.check_interval_duration(), Duration::from_millis(500));

        settings.check_interval = f64::NAN;
        assert_eq!(settings.check_interval_duration(), Duration::from_secs(1));

        settings.check_interval = f64::INFINITY;
        assert_eq!(settings.check_interval_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("FOLDER_MONITOR_CHECK_INTERVAL", "3.0");
        std::env::set_var("FOLDER_MONITOR_NOTIFICATIONS", "false");

        let settings = Settings::default().with_env_overrides();

        assert_eq!(settings.check_interval, 3.0);
        assert!(!settings.enable_notifications);

        std::env::set_var("FOLDER_MONITOR_CHECK_INTERVAL", "NaN");
        let settings = Settings::default().with_env_overrides();
        assert_eq!(settings.check_interval, 1.0);
        assert_eq!(settings.check_interval_duration(), Duration::from_secs(1));

        // Cleanup
        std::env::remove_var("FOLDER_MONITOR_CHECK_INTERVAL");
        std::env::remove_var("FOLDER_MONITOR_NOTIFICATIONS");
    }
}
