//! Notifier capability: status text and document delivery to the requester.

pub mod error;
pub mod outbox;
pub mod retry;

pub use error::{NotifyError, NotifyResult};
pub use outbox::OutboxNotifier;
pub use retry::{deliver_status, StatusRetry};

use crate::registry::JobHandle;
use async_trait::async_trait;
use std::path::Path;

/// Delivers status text and documents for a job.
///
/// Implementations wrap the messaging transport. `update_status` replaces the
/// job's status line; `send_document` uploads one file with a caption.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn update_status(&self, handle: &JobHandle, text: &str) -> NotifyResult<()>;

    async fn send_document(
        &self,
        handle: &JobHandle,
        path: &Path,
        filename: &str,
        caption: &str,
    ) -> NotifyResult<()>;
}
