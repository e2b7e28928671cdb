use crate::progress::render::render_progress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One progress sample from the fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub bytes_downloaded: u64,
    /// Unknown for most live streams
    pub total_bytes: Option<u64>,
    /// Bytes per second
    pub speed: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(bytes_downloaded: u64, total_bytes: Option<u64>) -> Self {
        Self {
            bytes_downloaded,
            total_bytes,
            speed: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_speed(mut self, bytes_per_sec: f64) -> Self {
        self.speed = Some(bytes_per_sec);
        self
    }

    /// Percentage complete, when a positive total is known
    pub fn percent(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                Some(self.bytes_downloaded as f64 / total as f64 * 100.0)
            }
            _ => None,
        }
    }
}

/// Pending non-terminal status text.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Progress(ProgressEvent),
    /// Phase announcement such as "Starting download..."
    Phase(String),
}

impl StatusUpdate {
    pub fn render(&self) -> String {
        match self {
            StatusUpdate::Progress(event) => render_progress(event),
            StatusUpdate::Phase(text) => text.clone(),
        }
    }
}
