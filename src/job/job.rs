use crate::config::JobOptions;
use crate::fetch::{FetchResult, Fetcher};
use crate::job::error::{JobError, JobResult};
use crate::job::types::{terminal_text, JobReport};
use crate::job::workspace::JobWorkspace;
use crate::metrics;
use crate::notify::{Notifier, NotifyError};
use crate::progress::{format_megabytes, ProgressBridge};
use crate::registry::{JobEvent, JobHandle, JobState, StateError};
use crate::split::{ArtifactPart, ArtifactSplitter, PartSink, SplitError};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct JobFacts {
    title: Option<String>,
    bytes: Option<u64>,
    documents_sent: usize,
}

/// Drives one admitted job through resolve, fetch, size check and delivery.
///
/// Cancellation is cooperative: the flag on the handle is checked before
/// analysis, after analysis, after the fetch, between parts and after the
/// upload. Calls already in flight run to completion, and a job flagged
/// before its final transition never reaches `Completed`.
pub struct DownloadJob {
    handle: JobHandle,
    source: String,
    options: JobOptions,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    workspace: JobWorkspace,
    facts: Mutex<JobFacts>,
}

impl DownloadJob {
    pub fn new(
        handle: JobHandle,
        source: impl Into<String>,
        options: JobOptions,
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            handle,
            source: source.into(),
            options,
            fetcher,
            notifier,
            workspace: JobWorkspace::new(temp_dir),
            facts: Mutex::new(JobFacts::default()),
        }
    }

    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    /// Run to a terminal state.
    ///
    /// Local files are removed before the terminal transition, and exactly
    /// one terminal status is sent after it.
    pub async fn run(self) -> JobReport {
        let bridge = ProgressBridge::new(
            self.notifier.clone(),
            self.handle.clone(),
            self.options.progress_interval(),
            self.options.status_retry(),
        );

        let work = async {
            let result = self.execute(&bridge).await;
            bridge.close();
            result
        };
        let (result, ()) = tokio::join!(work, bridge.drain());

        let removed = self.workspace.cleanup().await;
        tracing::debug!(job = self.handle.correlation_id(), "Removed {} local file(s)", removed);

        let (state, error) = self.conclude(result);
        bridge
            .flush_terminal(&terminal_text(state, error.as_deref()))
            .await;

        let facts = std::mem::take(&mut *self.facts.lock());
        JobReport {
            requester: self.handle.key().clone(),
            correlation_id: self.handle.correlation_id().to_string(),
            source: self.source.clone(),
            state,
            error,
            title: facts.title,
            bytes: facts.bytes,
            documents_sent: facts.documents_sent,
            status_updates: bridge.delivered(),
            started_at: self.handle.created_at(),
            finished_at: Utc::now(),
        }
    }

    async fn execute(&self, bridge: &ProgressBridge) -> JobResult<()> {
        tokio::fs::create_dir_all(self.workspace.dir()).await?;

        self.checkpoint("before analysis")?;
        self.advance(JobEvent::Start)?;
        bridge.announce("Checking stream...");

        let metadata = self
            .fetcher
            .resolve(&self.source, &self.options.fetch)
            .await?;
        self.facts.lock().title = Some(metadata.title.clone());
        self.checkpoint("after analysis")?;

        let destination = self
            .workspace
            .dir()
            .join(metadata.local_file_name(self.handle.correlation_id()));
        self.workspace.track(&destination);

        self.advance(JobEvent::MetadataResolved)?;
        bridge.announce("Starting download...");

        let path = self
            .fetcher
            .download(&self.source, &destination, &self.options.fetch, bridge.sink())
            .await?;
        self.workspace.track(&path);

        let fetched = FetchResult::inspect(path, metadata).await?;
        self.facts.lock().bytes = Some(fetched.size);
        self.checkpoint("after fetch")?;

        let oversized = fetched.is_oversized(self.options.max_part_bytes);
        self.advance(JobEvent::FetchCompleted { oversized })?;

        if oversized {
            self.send_parts(&fetched, bridge).await?;
        } else {
            self.send_whole(&fetched, bridge).await?;
        }

        self.checkpoint("after upload")?;
        self.advance(JobEvent::Delivered)?;
        Ok(())
    }

    async fn send_whole(&self, fetched: &FetchResult, bridge: &ProgressBridge) -> JobResult<()> {
        bridge.announce("Uploading...");
        self.notifier
            .send_document(
                &self.handle,
                &fetched.path,
                &fetched.metadata.display_name(),
                &fetched.caption(),
            )
            .await?;

        metrics::record_document_sent(fetched.size);
        self.facts.lock().documents_sent = 1;
        Ok(())
    }

    async fn send_parts(&self, fetched: &FetchResult, bridge: &ProgressBridge) -> JobResult<()> {
        let splitter = ArtifactSplitter::new(self.options.max_part_bytes, self.options.part_delay())?;
        let parts = splitter.plan(&fetched.path, fetched.size)?;
        for part in &parts {
            self.workspace.track(&part.local_path);
        }

        bridge.announce(format!(
            "File is too large ({}). Splitting into {} parts...",
            format_megabytes(fetched.size),
            parts.len()
        ));

        let sink = JobPartSink {
            handle: &self.handle,
            notifier: self.notifier.as_ref(),
            bridge,
            display_name: fetched.metadata.display_name(),
            sent: AtomicUsize::new(0),
        };
        let outcome = splitter.split_and_send(&fetched.path, &parts, &sink).await;
        self.facts.lock().documents_sent = sink.sent.load(Ordering::Acquire);

        match outcome {
            Ok(_) => Ok(()),
            Err(SplitError::Interrupted { .. }) => Err(JobError::CancelledByUser),
            Err(e) => Err(e.into()),
        }
    }

    fn checkpoint(&self, stage: &str) -> JobResult<()> {
        if self.handle.is_cancel_requested() {
            tracing::info!(
                requester = %self.handle.key(),
                "Cancellation observed {}",
                stage
            );
            return Err(JobError::CancelledByUser);
        }
        Ok(())
    }

    fn advance(&self, event: JobEvent) -> JobResult<JobState> {
        let from = self.handle.state();
        let to = match self.handle.transition(event) {
            Ok(to) => to,
            // Cancel landed between the last checkpoint and this step
            Err(StateError::CancelRequested { .. }) => return Err(JobError::CancelledByUser),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            requester = %self.handle.key(),
            job = self.handle.correlation_id(),
            "{} -> {}",
            from,
            to
        );
        Ok(to)
    }

    /// Map the work outcome onto a terminal state.
    fn conclude(&self, result: JobResult<()>) -> (JobState, Option<String>) {
        let (event, error) = match result {
            Ok(()) => return (self.handle.state(), None),
            Err(JobError::CancelledByUser) => (JobEvent::Cancel, None),
            Err(e) => {
                tracing::error!(
                    requester = %self.handle.key(),
                    job = self.handle.correlation_id(),
                    "Job failed: {}",
                    e
                );
                (JobEvent::Fail, Some(e.to_string()))
            }
        };

        if let Err(e) = self.advance(event) {
            tracing::warn!("Terminal transition rejected: {}", e);
        }
        let state = self.handle.state();
        let error = if state == JobState::Failed { error } else { None };
        (state, error)
    }
}

/// Hands each part to the notifier and reports per-part phases.
struct JobPartSink<'a> {
    handle: &'a JobHandle,
    notifier: &'a dyn Notifier,
    bridge: &'a ProgressBridge,
    display_name: String,
    sent: AtomicUsize,
}

#[async_trait]
impl<'a> PartSink for JobPartSink<'a> {
    async fn deliver(&self, part: &ArtifactPart) -> Result<(), NotifyError> {
        self.bridge.announce(format!(
            "Sending part {} of {}...",
            part.index, part.total_parts
        ));
        self.notifier
            .send_document(
                self.handle,
                &part.local_path,
                &part.file_name(&self.display_name),
                &part.caption(),
            )
            .await?;
        self.sent.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn should_stop(&self) -> bool {
        self.handle.is_cancel_requested()
    }
}
