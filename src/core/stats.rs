use std::collections::HashMap;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// In-memory counters for one monitoring session. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub total_files_moved: u64,
    pub total_errors: u64,
    pub session_start_time: Option<DateTime<Utc>>,
    pub last_file_moved: Option<DateTime<Utc>>,
    /// Lowercase extension without dot; extensionless files count under "".
    pub file_type_counts: HashMap<String, u64>,
}

impl SessionStatistics {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record_move(&mut self, extension: &str, at: DateTime<Utc>) {
        self.total_files_moved += 1;
        self.last_file_moved = Some(at);
        *self
            .file_type_counts
            .entry(extension.to_lowercase())
            .or_insert(0) += 1;
    }

    pub fn record_error(&mut self) {
        self.total_errors += 1;
    }

    /// Zero when no session is running.
    pub fn session_duration(&self, now: DateTime<Utc>) -> Duration {
        match self.session_start_time {
            Some(start) if now > start => now - start,
            _ => Duration::zero(),
        }
    }

    /// `M:SS`, or `H:MM:SS` once the session passes an hour.
    pub fn formatted_session_duration(&self, now: DateTime<Utc>) -> String {
        format_duration(self.session_duration(now))
    }

    /// Extension counts, most frequent first, ties by name.
    pub fn file_types_by_count(&self) -> Vec<(&str, u64)> {
        let mut counts: Vec<(&str, u64)> = self
            .file_type_counts
            .iter()
            .map(|(ext, count)| (ext.as_str(), *count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        counts
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = total % 3600 / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_move_counts_by_extension() {
        let mut stats = SessionStatistics::default();
        let now = Utc::now();
        stats.record_move("PDF", now);
        stats.record_move("pdf", now);
        stats.record_move("", now);

        assert_eq!(stats.total_files_moved, 3);
        assert_eq!(stats.file_type_counts.get("pdf"), Some(&2));
        assert_eq!(stats.file_type_counts.get(""), Some(&1));
        assert_eq!(stats.last_file_moved, Some(now));
    }

    #[test]
    fn test_duration_zero_without_session() {
        let stats = SessionStatistics::default();
        assert_eq!(stats.session_duration(Utc::now()), Duration::zero());
        assert_eq!(stats.formatted_session_duration(Utc::now()), "0:00");
    }

    #[test]
    fn test_formatted_duration() {
        let start = Utc::now();
        let stats = SessionStatistics {
            session_start_time: Some(start),
            ..Default::default()
        };

        assert_eq!(stats.formatted_session_duration(start + Duration::seconds(75)), "1:15");
        assert_eq!(stats.formatted_session_duration(start + Duration::seconds(3725)), "1:02:05");
    }

    #[test]
    fn test_file_types_sorted_by_count() {
        let mut stats = SessionStatistics::default();
        let now = Utc::now();
        stats.record_move("txt", now);
        stats.record_move("jpg", now);
        stats.record_move("jpg", now);
        stats.record_move("png", now);

        assert_eq!(stats.file_types_by_count(), vec![("jpg", 2), ("png", 1), ("txt", 1)]);
    }

    #[test]
    fn test_reset() {
        let mut stats = SessionStatistics::default();
        stats.record_move("txt", Utc::now());
        stats.record_error();
        stats.session_start_time = Some(Utc::now());

        stats.reset();
        assert_eq!(stats, SessionStatistics::default());
    }
}
