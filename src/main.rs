use clap::Parser;
use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use folder_monitor::{
    cli::{
        Cli, Command, OutputFormat, ProfileCommand, RunArgs, SettingsArgs, SettingsCommand,
        WatchMode,
    },
    store::{resolve_state_dir, JsonFileStore, KeyValueStore, MemoryStore},
    DesktopNotifier, EngineEvent, FileEvent, FileEventKind, Monitor, Profile, Settings,
    StartOutcome, Ticker, Wake,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.setup_logging();

    let mut monitor = open_monitor(&cli)?;

    match &cli.command {
        Some(Command::Profile(cmd)) => run_profile_command(&mut monitor, cmd)?,
        Some(Command::Settings(cmd)) => run_settings_command(&mut monitor, cmd)?,
        Some(Command::Run(args)) => run_monitoring(&mut monitor, args)?,
        Some(Command::Status) => print_status(&monitor),
        None => {
            if monitor.settings().auto_start_on_launch {
                run_monitoring(&mut monitor, &RunArgs::default())?;
            } else {
                print_status(&monitor);
            }
        }
    }

    Ok(())
}

fn open_monitor(cli: &Cli) -> Result<Monitor> {
    let store: Box<dyn KeyValueStore> = match resolve_state_dir(cli.state_dir.as_deref()) {
        Some(dir) => {
            tracing::debug!("Using state directory {}", dir.display());
            Box::new(JsonFileStore::open_in_dir(&dir)?)
        }
        None => {
            tracing::warn!("No state directory available; profiles will not be saved");
            Box::new(MemoryStore::new())
        }
    };

    Ok(Monitor::open(store, Box::new(DesktopNotifier)).with_env_overrides())
}

fn resolve_profile(monitor: &Monitor, key: &str) -> Result<Profile> {
    Ok(monitor.find_profile(key)?.clone())
}

fn run_profile_command(monitor: &mut Monitor, cmd: &ProfileCommand) -> Result<()> {
    match cmd {
        ProfileCommand::Add { name, watch, dest, extensions, activate } => {
            if name.trim().is_empty() {
                bail!("Profile name must not be empty");
            }
            let profile = Profile::new(name.clone(), watch.clone(), dest.clone())
                .with_extensions(extensions.iter().flatten());
            let id = profile.id;

            if !profile.is_valid() {
                tracing::warn!(
                    "Profile '{}' is not usable until both folders exist",
                    profile.display_name()
                );
            }
            monitor.add_profile(profile);
            if *activate {
                monitor.set_active_profile(id)?;
            }
            println!("Added profile {} ({})", name, id);
        }
        ProfileCommand::Edit { profile, name, watch, dest, extensions } => {
            let mut updated = resolve_profile(monitor, profile)?;
            if let Some(name) = name {
                updated.name = name.clone();
            }
            if let Some(watch) = watch {
                updated.watch_folder = watch.clone();
            }
            if let Some(dest) = dest {
                updated.destination_folder = dest.clone();
            }
            if let Some(extensions) = extensions {
                updated.set_extensions(extensions);
            }
            monitor.update_profile(updated.clone());
            println!("Updated profile {}", updated.display_name());
        }
        ProfileCommand::Remove { profile } => {
            let target = resolve_profile(monitor, profile)?;
            monitor.delete_profile(target.id);
            println!("Removed profile {}", target.display_name());
        }
        ProfileCommand::Activate { profile } => {
            let target = resolve_profile(monitor, profile)?;
            monitor.set_active_profile(target.id)?;
            println!("Active profile: {}", target.display_name());
        }
        ProfileCommand::List => print_profiles(monitor),
    }
    Ok(())
}

fn run_settings_command(monitor: &mut Monitor, cmd: &SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Show => print_settings(monitor.settings())?,
        SettingsCommand::Set(args) => {
            if args.is_empty() {
                bail!("Nothing to change; pass at least one setting");
            }
            apply_settings(monitor.settings_mut(), args);
            monitor.save_settings()?;
            print_settings(monitor.settings())?;
        }
        SettingsCommand::Reset => {
            monitor.reset_settings()?;
            print_settings(monitor.settings())?;
        }
    }
    Ok(())
}

fn apply_settings(settings: &mut Settings, args: &SettingsArgs) {
    if let Some(value) = args.enable_notifications {
        settings.enable_notifications = value;
    }
    if let Some(value) = args.show_in_menu_bar {
        settings.show_in_menu_bar = value;
    }
    if let Some(value) = args.auto_start_on_launch {
        settings.auto_start_on_launch = value;
    }
    if let Some(value) = args.check_interval {
        settings.check_interval = value;
    }
    if let Some(value) = args.max_recent_events {
        settings.max_recent_events = value;
    }
    if let Some(value) = args.enable_file_conflict_resolution {
        settings.enable_file_conflict_resolution = value;
    }
}

fn run_monitoring(monitor: &mut Monitor, args: &RunArgs) -> Result<()> {
    let events = monitor.subscribe();

    match monitor.start()? {
        StartOutcome::Started => {}
        StartOutcome::AlreadyRunning => {}
        StartOutcome::InvalidProfile => {
            bail!("{}", monitor.error_message().unwrap_or("Invalid profile configuration"));
        }
    }

    let profile = monitor
        .session()
        .current_profile()
        .cloned()
        .context("Monitoring session has no profile")?;
    let interval = monitor
        .session()
        .poll_interval()
        .unwrap_or_else(|| monitor.effective_settings().check_interval_duration());

    let ticker = match args.mode {
        WatchMode::Polling => Ticker::polling(interval),
        WatchMode::Native => Ticker::native_or_polling(&profile.watch_folder, interval),
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    if args.output == OutputFormat::Text {
        println!("Watching: {}", profile.watch_folder.display());
        println!("Moving to: {}", profile.destination_folder.display());
        println!("Files: {}", profile.extensions_text());
        println!("Press Ctrl+C to quit");
        println!("---");
    }

    drain_events(&events, args)?;

    while running.load(Ordering::SeqCst) && monitor.is_monitoring() {
        match ticker.wait(&running) {
            Wake::Stopped => break,
            Wake::Interval | Wake::FileSystem => {
                monitor.tick();
            }
        }
        drain_events(&events, args)?;
    }

    let summary = format_summary(monitor);
    monitor.stop();
    drain_events(&events, args)?;

    if args.output == OutputFormat::Text {
        println!("---");
        println!("{}", summary);
    }

    Ok(())
}

fn drain_events(events: &Receiver<EngineEvent>, args: &RunArgs) -> Result<()> {
    for event in events.try_iter() {
        match args.output {
            OutputFormat::Json => print_json_event(&event)?,
            OutputFormat::Text => print_text_event(&event, args.no_color),
            OutputFormat::Compact => print_compact_event(&event),
        }
    }
    Ok(())
}

fn print_json_event(event: &EngineEvent) -> Result<()> {
    match event {
        EngineEvent::EventAppended(file_event) => {
            println!("{}", serde_json::to_string(file_event)?);
        }
        EngineEvent::MonitoringToggled(on) => {
            println!("{}", serde_json::json!({ "monitoring": on }));
        }
        _ => {}
    }
    Ok(())
}

fn print_text_event(event: &EngineEvent, no_color: bool) {
    match event {
        EngineEvent::EventAppended(file_event) => print_text_file_event(file_event, no_color),
        EngineEvent::ErrorChanged(Some(message)) => {
            if no_color {
                println!("ERROR {}", message);
            } else {
                println!("\x1b[31mERROR\x1b[0m {}", message);
            }
        }
        EngineEvent::MonitoringToggled(on) => {
            println!("Monitoring {}", if *on { "started" } else { "stopped" });
        }
        _ => {}
    }
}

fn print_text_file_event(event: &FileEvent, no_color: bool) {
    let time_str = event.timestamp.with_timezone(&Local).format("%H:%M:%S");
    let label = event.kind.label().to_uppercase();

    if no_color {
        print!("[{}] {} {}", time_str, label, event.path.display());
    } else {
        let color = match event.kind {
            FileEventKind::Created => "\x1b[34m", // Blue
            FileEventKind::Moved => "\x1b[32m",   // Green
            FileEventKind::Error => "\x1b[31m",   // Red
        };
        print!("[{}] {}{}\x1b[0m {}", time_str, color, label, event.path.display());
    }

    match &event.error_message {
        Some(message) => println!(" ({})", message),
        None => println!(),
    }
}

fn print_compact_event(event: &EngineEvent) {
    if let EngineEvent::EventAppended(file_event) = event {
        let event_type = match file_event.kind {
            FileEventKind::Created => "C",
            FileEventKind::Moved => "M",
            FileEventKind::Error => "E",
        };
        println!("{} {}", event_type, file_event.path.display());
    }
}

fn format_summary(monitor: &Monitor) -> String {
    let stats = monitor.statistics();
    let mut summary = format!(
        "Session {}: {} moved, {} errors",
        stats.formatted_session_duration(Utc::now()),
        stats.total_files_moved,
        stats.total_errors
    );

    let types = stats.file_types_by_count();
    if !types.is_empty() {
        let parts: Vec<String> = types
            .iter()
            .map(|&(ext, count)| {
                let ext = if ext.is_empty() { "(none)" } else { ext };
                format!("{} {}", ext, count)
            })
            .collect();
        summary.push_str(&format!(" [{}]", parts.join(", ")));
    }
    summary
}

fn print_profiles(monitor: &Monitor) {
    let active_id = monitor.active_profile().map(|p| p.id);

    if monitor.profiles().is_empty() {
        println!("No profiles. Create one with `folder-monitor profile add`.");
        return;
    }

    for profile in monitor.profiles() {
        let marker = if Some(profile.id) == active_id { "*" } else { " " };
        let validity = if profile.is_valid() { "" } else { "  [invalid]" };
        println!(
            "{} {}  {}{}",
            marker,
            &profile.id.to_string()[..8],
            profile.display_name(),
            validity
        );
        println!(
            "    {} -> {}",
            profile.watch_folder.display(),
            profile.destination_folder.display()
        );
        println!(
            "    {}  (last used {})",
            profile.extensions_text(),
            profile.last_used_date.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_settings(settings: &Settings) -> Result<()> {
    print!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}

fn print_status(monitor: &Monitor) {
    match monitor.active_profile() {
        Some(profile) => println!("Active profile: {}", profile.display_name()),
        None => println!("Active profile: none"),
    }
    println!();
    print_profiles(monitor);
    println!();
    if let Err(err) = print_settings(monitor.settings()) {
        tracing::warn!("Failed to render settings: {}", err);
    }
}
