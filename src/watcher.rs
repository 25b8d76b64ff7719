use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use anyhow::{Context, Result};

/// Granularity at which a waiting ticker notices a stop request.
const WAKE_SLICE: Duration = Duration::from_millis(100);

/// Regular files directly inside `dir`, in listing order. Directories,
/// symlinks and other special entries are skipped.
pub fn list_files<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir.as_ref())? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!("Skipping unreadable entry: {}", err);
                continue;
            }
        };
        match entry.file_type() {
            Ok(file_type) if file_type.is_file() => files.push(entry.path()),
            Ok(_) => {}
            Err(err) => tracing::debug!("Skipping {}: {}", entry.path().display(), err),
        }
    }

    Ok(files)
}

/// Entries of `current` missing from `previous`, keeping `current`'s order.
pub fn new_entries(current: &[PathBuf], previous: &HashSet<PathBuf>) -> Vec<PathBuf> {
    current
        .iter()
        .filter(|path| !previous.contains(*path))
        .cloned()
        .collect()
}

/// Why a [`Ticker`] returned from [`Ticker::wait`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The interval elapsed
    Interval,
    /// The native watcher reported activity in the watched folder
    FileSystem,
    /// The running flag was cleared
    Stopped,
}

/// Schedules scans. Polling tickers wake once per interval; native tickers
/// also wake early whenever the OS reports a change in the watched folder.
/// Either way the caller does the same snapshot diff.
pub struct Ticker {
    interval: Duration,
    native: Option<NativeWake>,
}

struct NativeWake {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
}

impl Ticker {
    pub fn polling(interval: Duration) -> Self {
        Self {
            interval,
            native: None,
        }
    }

    pub fn native<P: AsRef<Path>>(dir: P, interval: Duration) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();

        let mut watcher = notify::recommended_watcher(tx)
            .context("Failed to create file system watcher")?;
        watcher
            .watch(dir.as_ref(), RecursiveMode::NonRecursive)
            .context("Failed to start watching directory")?;

        Ok(Self {
            interval,
            native: Some(NativeWake {
                _watcher: watcher,
                rx,
            }),
        })
    }

    /// Native when possible, polling otherwise.
    pub fn native_or_polling<P: AsRef<Path>>(dir: P, interval: Duration) -> Self {
        match Self::native(dir, interval) {
            Ok(ticker) => ticker,
            Err(err) => {
                tracing::warn!("Native watching unavailable, falling back to polling: {:#}", err);
                Self::polling(interval)
            }
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_native(&self) -> bool {
        self.native.is_some()
    }

    pub fn wait(&self, running: &AtomicBool) -> Wake {
        let deadline = Instant::now() + self.interval;

        loop {
            if !running.load(Ordering::SeqCst) {
                return Wake::Stopped;
            }

            let now = Instant::now();
            if now >= deadline {
                return Wake::Interval;
            }
            let slice = (deadline - now).min(WAKE_SLICE);

            match &self.native {
                Some(native) => match native.rx.recv_timeout(slice) {
                    Ok(Ok(_)) => {
                        // Coalesce a burst into one wake.
                        while native.rx.try_recv().is_ok() {}
                        return Wake::FileSystem;
                    }
                    Ok(Err(err)) => tracing::warn!("File watcher error: {}", err),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => thread::sleep(slice),
                },
                None => thread::sleep(slice),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_files_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        fs::write(temp_dir.path().join(".hidden"), "h").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("sub").join("nested.txt"), "n").unwrap();

        let mut files = list_files(temp_dir.path()).unwrap();
        files.sort();

        assert_eq!(
            files,
            vec![temp_dir.path().join(".hidden"), temp_dir.path().join("a.txt")]
        );
    }

    #[test]
    fn test_list_files_missing_dir_errors() {
        let temp_dir = TempDir::new().unwrap();
        assert!(list_files(temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_new_entries() {
        let previous: HashSet<PathBuf> = [PathBuf::from("/w/a"), PathBuf::from("/w/b")]
            .into_iter()
            .collect();
        let current = vec![PathBuf::from("/w/b"), PathBuf::from("/w/c"), PathBuf::from("/w/d")];

        assert_eq!(
            new_entries(&current, &previous),
            vec![PathBuf::from("/w/c"), PathBuf::from("/w/d")]
        );
    }

    #[test]
    fn test_polling_wait_stops_on_flag() {
        let ticker = Ticker::polling(Duration::from_secs(60));
        let running = AtomicBool::new(false);
        assert_eq!(ticker.wait(&running), Wake::Stopped);
    }

    #[test]
    fn test_polling_wait_elapses() {
        let ticker = Ticker::polling(Duration::from_millis(20));
        let running = AtomicBool::new(true);
        assert_eq!(ticker.wait(&running), Wake::Interval);
        assert!(!ticker.is_native());
    }
}
