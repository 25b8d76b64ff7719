//! User-facing notifications for move outcomes
//!
//! Delivery is fire-and-forget. When the platform refuses or the helper is
//! missing, the call does nothing beyond a debug log.

use std::process::{Command, Stdio};

pub trait Notifier {
    fn notify(&self, title: &str, body: &str);
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!("{}: {}", title, body);
    }
}

/// Desktop notifications through the platform's command-line helper
/// (`osascript` on macOS, `notify-send` elsewhere).
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    fn command(title: &str, body: &str) -> Command {
        if cfg!(target_os = "macos") {
            let script = format!(
                "display notification \"{}\" with title \"{}\"",
                escape_applescript(body),
                escape_applescript(title)
            );
            let mut cmd = Command::new("osascript");
            cmd.arg("-e").arg(script);
            cmd
        } else {
            let mut cmd = Command::new("notify-send");
            cmd.arg("--app-name=folder-monitor").arg(title).arg(body);
            cmd
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::debug!("Notification: {}: {}", title, body);

        let spawned = Self::command(title, body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            // Reap in the background so the tick never waits on the helper.
            Ok(mut child) => {
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(err) => tracing::debug!("Notification not delivered: {}", err),
        }
    }
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
