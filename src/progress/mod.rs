//! Fetch progress to status notification bridge.
//!
//! The fetcher reports progress from whatever thread it runs on. Events land
//! in a single-slot mailbox; the job's own task drains it at a bounded pace
//! and performs the notifier I/O.

pub mod bridge;
pub mod render;
pub mod types;

pub use bridge::{ProgressBridge, ProgressSink};
pub use render::{format_megabytes, render_progress};
pub use types::{ProgressEvent, StatusUpdate};
