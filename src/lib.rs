//! Download job manager: one active job per requester, fetch with throttled
//! progress, size-bounded split upload, and guaranteed cleanup.

pub mod config;
pub mod fetch;
pub mod job;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod notify;
pub mod progress;
pub mod registry;
pub mod split;

pub use config::{ConfigError, JobOptions, ManagerConfig};
pub use fetch::{FetchError, FetchOptions, FetchResult, Fetcher, LocalFileFetcher, Metadata};
pub use job::{DownloadJob, JobError, JobReport};
pub use manager::JobManager;
pub use notify::{Notifier, NotifyError, OutboxNotifier};
pub use progress::{ProgressBridge, ProgressEvent, ProgressSink};
pub use registry::{AdmissionError, JobHandle, JobRegistry, JobState, RequesterKey};
pub use split::{ArtifactPart, ArtifactSplitter, SplitError};
