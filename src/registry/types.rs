use crate::registry::error::StateResult;
use crate::registry::state_machine::JobStateMachine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Identity of whoever may own one active job (a chat user, an API client).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequesterKey(String);

impl RequesterKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequesterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequesterKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for RequesterKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<i64> for RequesterKey {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum JobState {
    Pending,
    Analyzing,
    Fetching,
    Splitting,
    Uploading,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    pub fn is_cancellable(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Analyzing => "analyzing",
            JobState::Fetching => "fetching",
            JobState::Splitting => "splitting",
            JobState::Uploading => "uploading",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEvent {
    Start,
    MetadataResolved,
    FetchCompleted { oversized: bool },
    Delivered,
    Cancel,
    Fail,
}

impl JobEvent {
    /// Events that move the job towards completion rather than ending it.
    pub fn is_forward(&self) -> bool {
        !matches!(self, JobEvent::Cancel | JobEvent::Fail)
    }
}

/// Shared view of one admitted job.
///
/// Cloning is cheap; every clone observes the same state, cancellation flag
/// and settlement signal. The registry holds one clone while the job is live.
#[derive(Clone)]
pub struct JobHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    key: RequesterKey,
    correlation_id: String,
    created_at: DateTime<Utc>,
    machine: JobStateMachine,
    // Flipped once the job is terminal and its registry slot is gone.
    settled: watch::Sender<bool>,
}

impl JobHandle {
    pub(crate) fn new(key: RequesterKey, correlation_id: String) -> Self {
        let (settled, _) = watch::channel(false);
        Self {
            inner: Arc::new(HandleInner {
                key,
                correlation_id,
                created_at: Utc::now(),
                machine: JobStateMachine::new(),
                settled,
            }),
        }
    }

    pub fn key(&self) -> &RequesterKey {
        &self.inner.key
    }

    pub fn correlation_id(&self) -> &str {
        &self.inner.correlation_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    pub fn state(&self) -> JobState {
        self.inner.machine.current_state()
    }

    /// Watch every state transition of this job.
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.inner.machine.subscribe()
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.inner.machine.is_cancel_requested()
    }

    /// Set the cancellation flag if the job can still be cancelled.
    ///
    /// A job flagged here can only end `Cancelled` or `Failed`.
    pub(crate) fn request_cancel(&self) -> bool {
        self.inner.machine.request_cancel()
    }

    pub(crate) fn transition(&self, event: JobEvent) -> StateResult<JobState> {
        self.inner.machine.transition(event)
    }

    pub(crate) fn settle(&self) {
        self.inner.settled.send_replace(true);
    }

    pub fn is_settled(&self) -> bool {
        *self.inner.settled.borrow()
    }

    /// Resolve once the job reached a terminal state and released its slot.
    pub async fn wait(&self) -> JobState {
        let mut rx = self.inner.settled.subscribe();
        // The sender lives in `inner`, which we hold, so this cannot close.
        let _ = rx.wait_for(|settled| *settled).await;
        self.state()
    }

    /// True when both handles refer to the same admitted job.
    pub fn same_job(&self, other: &JobHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("key", &self.inner.key)
            .field("correlation_id", &self.inner.correlation_id)
            .field("created_at", &self.inner.created_at)
            .field("state", &self.state())
            .field("cancel_requested", &self.is_cancel_requested())
            .finish()
    }
}
