use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use streamdrop::notify::NotifyResult;
use streamdrop::{JobHandle, JobManager, Notifier, NotifyError};

#[derive(Debug, Clone, PartialEq)]
pub struct Delivered {
    pub requester: String,
    pub filename: String,
    pub caption: String,
    pub bytes: Vec<u8>,
}

/// Records every status and document; failures are opt-in.
#[derive(Default)]
pub struct RecordingNotifier {
    pub statuses: Mutex<Vec<(String, String)>>,
    pub documents: Mutex<Vec<Delivered>>,
    /// Status calls attempted, including failed ones
    pub status_attempts: AtomicUsize,
    /// Fail this many status calls (transiently) before succeeding
    pub failing_statuses: AtomicUsize,
    /// Fail every status call
    pub status_down: bool,
    /// Reject the n-th document call (1-based)
    pub reject_document: Option<usize>,
    /// Request cancellation through this manager while the n-th document uploads
    pub cancel_during_document: Option<usize>,
    pub canceller: OnceLock<JobManager>,
    /// What `request_cancel` returned from inside the upload
    pub cancel_accepted: Mutex<Option<bool>>,
    pub document_calls: AtomicUsize,
}

impl RecordingNotifier {
    pub fn failing_first_statuses(n: usize) -> Self {
        let notifier = Self::default();
        notifier.failing_statuses.store(n, Ordering::SeqCst);
        notifier
    }

    pub fn status_texts(&self, requester: &str) -> Vec<String> {
        self.statuses
            .lock()
            .iter()
            .filter(|(r, _)| r == requester)
            .map(|(_, t)| t.clone())
            .collect()
    }

    /// Terminal messages ("Download completed" and friends) for a requester
    pub fn terminal_texts(&self, requester: &str) -> Vec<String> {
        self.status_texts(requester)
            .into_iter()
            .filter(|t| t.starts_with("Download "))
            .collect()
    }

    pub fn documents_for(&self, requester: &str) -> Vec<Delivered> {
        self.documents
            .lock()
            .iter()
            .filter(|d| d.requester == requester)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn update_status(&self, handle: &JobHandle, text: &str) -> NotifyResult<()> {
        self.status_attempts.fetch_add(1, Ordering::SeqCst);
        if self.status_down {
            return Err(NotifyError::Transient("flood wait".to_string()));
        }
        let pending_failures = self.failing_statuses.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.failing_statuses.store(pending_failures - 1, Ordering::SeqCst);
            return Err(NotifyError::Transient("timeout".to_string()));
        }

        self.statuses
            .lock()
            .push((handle.key().to_string(), text.to_string()));
        Ok(())
    }

    async fn send_document(
        &self,
        handle: &JobHandle,
        path: &Path,
        filename: &str,
        caption: &str,
    ) -> NotifyResult<()> {
        let call = self.document_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject_document == Some(call) {
            return Err(NotifyError::Rejected("file too large".to_string()));
        }
        if self.cancel_during_document == Some(call) {
            if let Some(manager) = self.canceller.get() {
                let accepted = manager.request_cancel(handle.key().clone());
                *self.cancel_accepted.lock() = Some(accepted);
            }
        }

        let bytes = tokio::fs::read(path).await?;
        self.documents.lock().push(Delivered {
            requester: handle.key().to_string(),
            filename: filename.to_string(),
            caption: caption.to_string(),
            bytes,
        });
        Ok(())
    }
}
