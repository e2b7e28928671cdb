//! Scripted collaborators for driving the job manager in tests
//!
//! The fetcher writes deterministic bytes and can be held mid-download; the
//! notifier records everything it is asked to deliver and can be told to fail.

#![allow(dead_code)]

pub mod fetcher;
pub mod notifier;

pub use fetcher::{pattern, FetchOutcome, ScriptedFetcher};
pub use notifier::{Delivered, RecordingNotifier};

use std::path::Path;
use streamdrop::{JobOptions, ManagerConfig};

/// Options with short intervals and no pauses
pub fn fast_options(max_part_bytes: u64) -> JobOptions {
    JobOptions {
        max_part_bytes,
        progress_interval_secs: 0.02,
        notify_retry_count: 3,
        notify_retry_delay_secs: 0.0,
        part_delay_secs: 0.0,
        ..Default::default()
    }
}

pub fn config(temp_dir: &Path, max_part_bytes: u64) -> ManagerConfig {
    ManagerConfig {
        temp_dir: temp_dir.to_path_buf(),
        defaults: fast_options(max_part_bytes),
    }
}

/// Names of files left in `dir`
pub fn leftovers(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}
