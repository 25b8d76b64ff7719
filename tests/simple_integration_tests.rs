use std::fs;
use tempfile::TempDir;
use folder_monitor::{
    core::{KEY_ACTIVE_PROFILE_ID, KEY_SAVED_PROFILES},
    JsonFileStore, KeyValueStore, LogNotifier, Monitor, Profile, Settings,
};

fn open(dir: &std::path::Path) -> Monitor {
    let store = JsonFileStore::open_in_dir(dir).expect("Failed to open state store");
    Monitor::open(Box::new(store), Box::new(LogNotifier))
}

#[test]
fn test_profiles_survive_restart() {
    let state = TempDir::new().expect("Failed to create temp dir");

    let id = {
        let mut monitor = open(state.path());
        let profile = Profile::new("Downloads", "/tmp/in", "/tmp/out").with_extensions(["pdf"]);
        let id = profile.id;
        monitor.add_profile(profile);
        monitor.add_profile(Profile::new("Photos", "/tmp/cam", "/tmp/pics"));
        monitor.set_active_profile(id).unwrap();
        id
    };

    let monitor = open(state.path());
    let names: Vec<_> = monitor.profiles().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Downloads", "Photos"]);
    assert_eq!(monitor.active_profile().map(|p| p.id), Some(id));
    assert_eq!(monitor.active_profile().unwrap().file_extensions, vec!["pdf"]);
}

#[test]
fn test_settings_survive_restart() {
    let state = TempDir::new().expect("Failed to create temp dir");

    {
        let mut monitor = open(state.path());
        monitor.settings_mut().check_interval = 2.0;
        monitor.settings_mut().auto_start_on_launch = true;
        monitor.save_settings().unwrap();
    }

    let monitor = open(state.path());
    assert_eq!(monitor.settings().check_interval, 2.0);
    assert!(monitor.settings().auto_start_on_launch);
    assert_eq!(monitor.settings().max_recent_events, Settings::default().max_recent_events);
}

#[test]
fn test_deleting_active_profile_clears_stored_reference() {
    let state = TempDir::new().expect("Failed to create temp dir");

    {
        let mut monitor = open(state.path());
        let profile = Profile::new("Temp", "/tmp/a", "/tmp/b");
        let id = profile.id;
        monitor.add_profile(profile);
        monitor.set_active_profile(id).unwrap();
        monitor.delete_profile(id);
    }

    let store = JsonFileStore::open_in_dir(state.path()).unwrap();
    assert_eq!(store.get(KEY_ACTIVE_PROFILE_ID), None);
    assert_eq!(store.get(KEY_SAVED_PROFILES), Some(serde_json::json!([])));
}

#[test]
fn test_corrupt_state_file_starts_empty() {
    let state = TempDir::new().expect("Failed to create temp dir");
    fs::write(state.path().join("state.json"), "definitely not json").unwrap();

    let mut monitor = open(state.path());
    assert!(monitor.profiles().is_empty());
    assert_eq!(monitor.settings(), &Settings::default());

    // The next write replaces the corrupt file.
    monitor.add_profile(Profile::new("Fresh", "/tmp/a", "/tmp/b"));
    let reopened = open(state.path());
    assert_eq!(reopened.profiles().len(), 1);
}
