use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::{MonitorError, Result};

/// A named watch folder / destination folder pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub watch_folder: PathBuf,
    pub destination_folder: PathBuf,
    /// Lowercase, without leading dot. Empty matches every file.
    pub file_extensions: Vec<String>,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub last_used_date: DateTime<Utc>,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        watch_folder: impl Into<PathBuf>,
        destination_folder: impl Into<PathBuf>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            watch_folder: watch_folder.into(),
            destination_folder: destination_folder.into(),
            file_extensions: Vec::new(),
            is_active: false,
            created_date: now,
            last_used_date: now,
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_extensions(extensions);
        self
    }

    /// Replace the extension filter, normalising each entry.
    pub fn set_extensions<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.file_extensions.clear();
        for ext in extensions {
            if let Some(ext) = normalize_extension(ext.as_ref()) {
                if !self.file_extensions.contains(&ext) {
                    self.file_extensions.push(ext);
                }
            }
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Untitled Profile"
        } else {
            &self.name
        }
    }

    pub fn extensions_text(&self) -> String {
        if self.file_extensions.is_empty() {
            return "All files".to_string();
        }
        self.file_extensions
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether `path` passes the extension filter. Entries match as a
    /// suffix, so `tar.gz` matches `backup.tar.gz`.
    pub fn matches_extension(&self, path: &Path) -> bool {
        if self.file_extensions.is_empty() {
            return true;
        }
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_lowercase(),
            None => return false,
        };
        self.file_extensions
            .iter()
            .any(|ext| has_extension(&name, ext))
    }

    /// Re-checked on every call; nothing is cached.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MonitorError::invalid_profile("profile name is empty"));
        }
        if !self.watch_folder.is_dir() {
            return Err(MonitorError::invalid_profile(format!(
                "watch folder does not exist: {}",
                self.watch_folder.display()
            )));
        }
        if !self.destination_folder.is_dir() {
            return Err(MonitorError::invalid_profile(format!(
                "destination folder does not exist: {}",
                self.destination_folder.display()
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Trim, lowercase and strip a leading dot. Empty input yields `None`.
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

// `name` must keep a non-empty stem before the dot.
fn has_extension(name: &str, ext: &str) -> bool {
    match name.strip_suffix(ext).and_then(|rest| rest.strip_suffix('.')) {
        Some(stem) => !stem.is_empty(),
        None => false,
    }
}

/// Lowercased extension of `path`, empty for extensionless files.
pub fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
