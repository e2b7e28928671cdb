use crate::registry::{JobState, RequesterKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of a finished job, kept by the manager after release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub requester: RequesterKey,
    pub correlation_id: String,
    pub source: String,
    pub state: JobState,
    /// Failure description, present only for `Failed`
    pub error: Option<String>,
    pub title: Option<String>,
    /// On-disk artifact size, once the fetch finished
    pub bytes: Option<u64>,
    /// Documents accepted by the notifier (1 for a whole upload, N for parts)
    pub documents_sent: usize,
    pub status_updates: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn terminal_text(&self) -> String {
        terminal_text(self.state, self.error.as_deref())
    }
}

/// The single terminal status line shown to the requester.
pub fn terminal_text(state: JobState, error: Option<&str>) -> String {
    match state {
        JobState::Completed => "Download completed".to_string(),
        JobState::Cancelled => "Download cancelled".to_string(),
        _ => format!("Download failed: {}", error.unwrap_or("unknown error")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_texts() {
        assert_eq!(terminal_text(JobState::Completed, None), "Download completed");
        assert_eq!(terminal_text(JobState::Cancelled, None), "Download cancelled");
        assert_eq!(
            terminal_text(JobState::Failed, Some("Not found: x")),
            "Download failed: Not found: x"
        );
        assert_eq!(
            terminal_text(JobState::Failed, None),
            "Download failed: unknown error"
        );
    }

    #[test]
    fn test_report_serializes() {
        let now = Utc::now();
        let report = JobReport {
            requester: "alice".into(),
            correlation_id: "msg-1".to_string(),
            source: "file:///tmp/a.mp4".to_string(),
            state: JobState::Completed,
            error: None,
            title: Some("a".to_string()),
            bytes: Some(42),
            documents_sent: 1,
            status_updates: 3,
            started_at: now,
            finished_at: now + chrono::Duration::seconds(2),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["requester"], "alice");
        assert_eq!(json["state"], "Completed");
        assert_eq!(report.duration(), chrono::Duration::seconds(2));
        assert_eq!(report.terminal_text(), "Download completed");
    }
}
