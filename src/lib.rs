pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod monitor;
pub mod notifier;
pub mod store;
pub mod watcher;

pub use crate::core::*;
pub use config::Settings;
pub use error::MonitorError;
pub use monitor::Monitor;
pub use notifier::{DesktopNotifier, LogNotifier, Notifier};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use watcher::{Ticker, Wake};
