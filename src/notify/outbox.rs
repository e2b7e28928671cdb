//! Notifier that drops documents into a local outbox directory.
//!
//! Each requester gets a subdirectory; status lines go to the log. Useful for
//! running the pipeline without a chat transport attached.

use crate::fetch::types::sanitize_file_name;
use crate::notify::{Notifier, NotifyError, NotifyResult};
use crate::registry::{JobHandle, RequesterKey};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct OutboxNotifier {
    root: PathBuf,
    /// Last status text per requester, replaced by each new job
    statuses: RwLock<HashMap<RequesterKey, String>>,
}

impl OutboxNotifier {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            statuses: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Most recent status text shown to a requester
    pub fn last_status(&self, key: impl Into<RequesterKey>) -> Option<String> {
        self.statuses.read().get(&key.into()).cloned()
    }

    fn requester_dir(&self, handle: &JobHandle) -> PathBuf {
        self.root.join(sanitize_file_name(handle.key().as_str()))
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn update_status(&self, handle: &JobHandle, text: &str) -> NotifyResult<()> {
        tracing::info!(
            requester = %handle.key(),
            job = handle.correlation_id(),
            "status: {}",
            text
        );
        self.statuses
            .write()
            .insert(handle.key().clone(), text.to_string());
        Ok(())
    }

    async fn send_document(
        &self,
        handle: &JobHandle,
        path: &Path,
        filename: &str,
        caption: &str,
    ) -> NotifyResult<()> {
        let name = sanitize_file_name(filename);
        if name.is_empty() {
            return Err(NotifyError::Rejected(format!(
                "unusable filename {filename:?}"
            )));
        }

        let dir = self.requester_dir(handle);
        tokio::fs::create_dir_all(&dir).await?;

        let target = dir.join(&name);
        let bytes = tokio::fs::copy(path, &target).await?;
        tokio::fs::write(dir.join(format!("{name}.caption.txt")), caption).await?;

        tracing::info!(
            requester = %handle.key(),
            "delivered {} ({} bytes) to {}",
            name,
            bytes,
            target.display()
        );
        Ok(())
    }
}
