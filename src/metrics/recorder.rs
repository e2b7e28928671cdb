//! Metrics recorder for download jobs

use crate::registry::JobState;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    describe_counter!("streamdrop_jobs_started_total", "Jobs admitted and started");
    describe_counter!(
        "streamdrop_jobs_finished_total",
        "Jobs that reached a terminal state, labelled by state"
    );
    describe_counter!(
        "streamdrop_admission_rejected_total",
        "Submissions refused because the requester already had an active job"
    );
    describe_counter!("streamdrop_parts_sent_total", "Artifact parts delivered");
    describe_counter!(
        "streamdrop_bytes_delivered_total",
        "Bytes delivered as documents or parts"
    );
    describe_counter!(
        "streamdrop_status_updates_dropped_total",
        "Status updates dropped after exhausting retries"
    );

    describe_gauge!("streamdrop_active_jobs", "Jobs currently running");

    describe_histogram!(
        "streamdrop_job_duration_seconds",
        "Wall time from admission to terminal state"
    );
}

/// Record a refused submission
pub fn record_admission_rejected() {
    counter!("streamdrop_admission_rejected_total").increment(1);
}

/// Record one part of a split artifact being delivered
pub fn record_part_sent(bytes: u64) {
    counter!("streamdrop_parts_sent_total").increment(1);
    counter!("streamdrop_bytes_delivered_total").increment(bytes);
}

/// Record a whole artifact being delivered in one document
pub fn record_document_sent(bytes: u64) {
    counter!("streamdrop_bytes_delivered_total").increment(bytes);
}

pub fn record_status_dropped() {
    counter!("streamdrop_status_updates_dropped_total").increment(1);
}

/// Tracks one job from start to terminal state
pub struct JobTimer {
    start_time: Instant,
}

impl JobTimer {
    /// Start tracking a new job
    pub fn start() -> Self {
        counter!("streamdrop_jobs_started_total").increment(1);
        gauge!("streamdrop_active_jobs").increment(1.0);

        Self {
            start_time: Instant::now(),
        }
    }

    /// Record the terminal state and duration
    pub fn finish(self, state: JobState) -> Duration {
        let duration = self.start_time.elapsed();
        counter!("streamdrop_jobs_finished_total", "state" => state.as_str()).increment(1);
        gauge!("streamdrop_active_jobs").decrement(1.0);
        histogram!("streamdrop_job_duration_seconds").record(duration.as_secs_f64());
        duration
    }
}
