use crate::config::{JobOptions, ManagerConfig};
use crate::fetch::Fetcher;
use crate::job::{terminal_text, DownloadJob, JobReport};
use crate::manager::slot::AdmissionSlot;
use crate::metrics::{self, JobTimer};
use crate::notify::{deliver_status, Notifier};
use crate::registry::{AdmissionError, JobEvent, JobHandle, JobRegistry, JobState, RequesterKey};
use chrono::Utc;
use dashmap::DashMap;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;

/// Admits, runs and supervises download jobs.
///
/// Cloning is cheap; all clones share one registry. `submit` spawns onto the
/// current tokio runtime.
#[derive(Clone)]
pub struct JobManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    registry: Arc<JobRegistry>,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    config: ManagerConfig,
    // Last finished job per requester
    reports: DashMap<RequesterKey, JobReport>,
}

impl JobManager {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        config: ManagerConfig,
    ) -> Self {
        metrics::init_metrics();
        Self {
            inner: Arc::new(ManagerInner {
                registry: Arc::new(JobRegistry::new()),
                fetcher,
                notifier,
                config,
                reports: DashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    pub fn default_options(&self) -> JobOptions {
        self.inner.config.defaults.clone()
    }

    /// Start a job for `key` with a fresh correlation id.
    pub fn submit(
        &self,
        key: impl Into<RequesterKey>,
        source: impl Into<String>,
        options: JobOptions,
    ) -> Result<JobHandle, AdmissionError> {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        self.submit_correlated(key, correlation_id, source, options)
    }

    /// Start a job with the manager's default options.
    pub fn submit_default(
        &self,
        key: impl Into<RequesterKey>,
        source: impl Into<String>,
    ) -> Result<JobHandle, AdmissionError> {
        self.submit(key, source, self.default_options())
    }

    /// Start a job tied to a caller-chosen correlation id (e.g. a message id).
    ///
    /// Fails with `AlreadyActive` while `key` has a live job; nothing is
    /// started in that case.
    pub fn submit_correlated(
        &self,
        key: impl Into<RequesterKey>,
        correlation_id: impl Into<String>,
        source: impl Into<String>,
        options: JobOptions,
    ) -> Result<JobHandle, AdmissionError> {
        let key = key.into();
        let source = source.into();

        options
            .validate()
            .map_err(|e| AdmissionError::InvalidOptions(e.to_string()))?;

        let handle = match self.inner.registry.try_admit(&key, correlation_id) {
            Ok(handle) => handle,
            Err(e) => {
                metrics::record_admission_rejected();
                tracing::info!(requester = %key, "Submission refused: {}", e);
                return Err(e);
            }
        };

        // Taken before spawning so the slot is freed even if the task never runs
        let slot = AdmissionSlot::new(self.inner.registry.clone(), handle.clone());
        let timer = JobTimer::start();
        let job = DownloadJob::new(
            handle.clone(),
            source.clone(),
            options.clone(),
            self.inner.fetcher.clone(),
            self.inner.notifier.clone(),
            self.inner.config.temp_dir.clone(),
        );

        tracing::info!(
            requester = %key,
            job = handle.correlation_id(),
            "Accepted {}",
            source
        );

        let span = tracing::info_span!(
            "job",
            requester = %key,
            job = %handle.correlation_id()
        );
        let inner = self.inner.clone();
        tokio::spawn(
            async move {
                inner.supervise(job, slot, timer, source, options).await;
            }
            .instrument(span),
        );

        Ok(handle)
    }

    /// Ask the live job of `key` to stop at its next checkpoint.
    pub fn request_cancel(&self, key: impl Into<RequesterKey>) -> bool {
        let key = key.into();
        let marked = self.inner.registry.mark_cancelled(&key);
        if marked {
            tracing::info!(requester = %key, "Cancellation requested");
        } else {
            tracing::debug!(requester = %key, "Nothing to cancel");
        }
        marked
    }

    pub fn is_active(&self, key: impl Into<RequesterKey>) -> bool {
        self.inner.registry.contains(&key.into())
    }

    pub fn active_count(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn active_handle(&self, key: impl Into<RequesterKey>) -> Option<JobHandle> {
        self.inner.registry.get(&key.into())
    }

    pub fn last_report(&self, key: impl Into<RequesterKey>) -> Option<JobReport> {
        self.inner
            .reports
            .get(&key.into())
            .map(|entry| entry.value().clone())
    }
}

impl ManagerInner {
    async fn supervise(
        &self,
        job: DownloadJob,
        mut slot: AdmissionSlot,
        timer: JobTimer,
        source: String,
        options: JobOptions,
    ) {
        let handle = job.handle().clone();

        let report = match AssertUnwindSafe(job.run()).catch_unwind().await {
            Ok(report) => report,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!("Job panicked: {}", message);
                self.fail_defect(&handle, &source, &options, message).await
            }
        };

        slot.release();
        let duration = timer.finish(report.state);
        tracing::info!(
            "Finished as {} after {:.1}s ({} document(s))",
            report.state,
            duration.as_secs_f64(),
            report.documents_sent
        );
        self.reports.insert(handle.key().clone(), report);

        // Settles the handle; waiters see the slot already gone
        drop(slot);
    }

    /// Force a job that panicked into `Failed` and tell the requester once.
    async fn fail_defect(
        &self,
        handle: &JobHandle,
        source: &str,
        options: &JobOptions,
        message: String,
    ) -> JobReport {
        let error = format!("internal error: {message}");

        // A panic after the terminal transition already had its message sent
        if !handle.state().is_terminal() && handle.transition(JobEvent::Fail).is_ok() {
            let text = terminal_text(JobState::Failed, Some(&error));
            deliver_status(&*self.notifier, handle, &text, &options.status_retry()).await;
        }

        let state = handle.state();
        JobReport {
            requester: handle.key().clone(),
            correlation_id: handle.correlation_id().to_string(),
            source: source.to_string(),
            state,
            error: (state == JobState::Failed).then_some(error),
            title: None,
            bytes: None,
            documents_sent: 0,
            status_updates: 0,
            started_at: handle.created_at(),
            finished_at: Utc::now(),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
