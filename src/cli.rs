use std::path::PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "folder-monitor")]
#[command(author = "Folder Monitor Contributors")]
#[command(version)]
#[command(about = "Watches a folder and moves newly arriving files into a destination folder")]
#[command(long_about = "Folder Monitor scans a watch folder at a fixed interval and moves every newly arrived file (optionally filtered by extension) into a destination folder, renaming on name collisions. Profiles and settings persist between runs.")]
pub struct Cli {
    /// Directory holding persisted profiles and settings
    #[arg(long, global = true, value_name = "DIR", help = "State directory (defaults to the platform config dir)")]
    pub state_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage watch profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Monitor the active profile until interrupted
    Run(RunArgs),

    /// Show profiles, the active profile and settings
    Status,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Create a profile
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, value_name = "DIR")]
        watch: PathBuf,
        #[arg(long, value_name = "DIR")]
        dest: PathBuf,
        #[arg(long, value_delimiter = ',', help = "File extensions to move (e.g., pdf,jpg). Empty moves everything")]
        extensions: Option<Vec<String>>,
        #[arg(long, help = "Make this the active profile")]
        activate: bool,
    },
    /// Change fields of an existing profile
    Edit {
        #[arg(value_name = "ID|NAME")]
        profile: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_name = "DIR")]
        watch: Option<PathBuf>,
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,
        #[arg(long, value_delimiter = ',', help = "Replace the extension filter; pass an empty value to match all files")]
        extensions: Option<Vec<String>>,
    },
    /// Delete a profile
    Remove {
        #[arg(value_name = "ID|NAME")]
        profile: String,
    },
    /// Make a profile the active one
    Activate {
        #[arg(value_name = "ID|NAME")]
        profile: String,
    },
    /// List profiles
    List,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the current settings
    Show,
    /// Change one or more settings
    Set(SettingsArgs),
    /// Restore every setting to its default
    Reset,
}

#[derive(Args, Default)]
pub struct SettingsArgs {
    #[arg(long, value_name = "BOOL")]
    pub enable_notifications: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub show_in_menu_bar: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub auto_start_on_launch: Option<bool>,
    #[arg(long, value_name = "SECS", help = "Seconds between scans (0.5 to 5.0)")]
    pub check_interval: Option<f64>,
    #[arg(long, value_name = "N", help = "Recent events to keep (10 to 50)")]
    pub max_recent_events: Option<usize>,
    #[arg(long, value_name = "BOOL")]
    pub enable_file_conflict_resolution: Option<bool>,
}

impl SettingsArgs {
    pub fn is_empty(&self) -> bool {
        self.enable_notifications.is_none()
            && self.show_in_menu_bar.is_none()
            && self.auto_start_on_launch.is_none()
            && self.check_interval.is_none()
            && self.max_recent_events.is_none()
            && self.enable_file_conflict_resolution.is_none()
    }
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// How scans are scheduled
    #[arg(short, long, default_value = "polling", help = "Scan scheduling mode")]
    pub mode: WatchMode,

    /// Output format for engine events
    #[arg(long, default_value = "text", help = "Output format")]
    pub output: OutputFormat,

    /// Disable colors in output
    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            mode: WatchMode::Polling,
            output: OutputFormat::Text,
            no_color: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WatchMode {
    /// Scan once per check interval
    Polling,
    /// Also scan as soon as the OS reports a change in the watch folder
    Native,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event, for scripting
    Json,
    /// Compact single-line format
    Compact,
}

impl Cli {
    pub fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_add() {
        let cli = Cli::parse_from([
            "folder-monitor",
            "profile",
            "add",
            "--name",
            "Docs",
            "--watch",
            "/in",
            "--dest",
            "/out",
            "--extensions",
            "pdf,JPG",
            "--activate",
        ]);

        match cli.command {
            Some(Command::Profile(ProfileCommand::Add { name, extensions, activate, .. })) => {
                assert_eq!(name, "Docs");
                assert_eq!(extensions, Some(vec!["pdf".to_string(), "JPG".to_string()]));
                assert!(activate);
            }
            _ => panic!("Expected profile add"),
        }
    }

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::parse_from(["folder-monitor", "--verbose", "run"]);
        assert!(cli.verbose);
        match cli.command {
            Some(Command::Run(args)) => {
                assert_eq!(args.mode, WatchMode::Polling);
                assert_eq!(args.output, OutputFormat::Text);
            }
            _ => panic!("Expected run"),
        }
    }

    #[test]
    fn test_parse_settings_set() {
        let cli = Cli::parse_from([
            "folder-monitor",
            "settings",
            "set",
            "--check-interval",
            "2.5",
            "--enable-notifications",
            "false",
        ]);
        match cli.command {
            Some(Command::Settings(SettingsCommand::Set(args))) => {
                assert_eq!(args.check_interval, Some(2.5));
                assert_eq!(args.enable_notifications, Some(false));
                assert!(!args.is_empty());
            }
            _ => panic!("Expected settings set"),
        }
    }

    #[test]
    fn test_no_command() {
        let cli = Cli::parse_from(["folder-monitor", "--state-dir", "/tmp/fm"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/fm")));
    }
}
