//! Metrics for the download job pipeline
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding application installs a recorder.
//!
//! Key metrics:
//! - Jobs started, finished (by terminal state) and refused at admission
//! - Active job gauge and job duration
//! - Parts and bytes delivered
//! - Status updates dropped after exhausting retries

pub mod recorder;

pub use recorder::{
    init_metrics, record_admission_rejected, record_document_sent, record_part_sent,
    record_status_dropped, JobTimer,
};
