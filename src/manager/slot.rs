use crate::registry::{JobEvent, JobHandle, JobRegistry};
use std::sync::Arc;

/// Owns a job's registry slot until the supervising task is done with it.
///
/// Dropping the guard forces a non-terminal job to `Failed`, frees the slot
/// if it is still held and settles the handle, so waiters wake even when the
/// supervising task is torn down early.
pub(crate) struct AdmissionSlot {
    registry: Arc<JobRegistry>,
    handle: JobHandle,
    released: bool,
}

impl AdmissionSlot {
    pub(crate) fn new(registry: Arc<JobRegistry>, handle: JobHandle) -> Self {
        Self {
            registry,
            handle,
            released: false,
        }
    }

    /// Free the registry entry. Later calls do nothing.
    pub(crate) fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if !self.registry.release_job(&self.handle) {
            tracing::warn!(requester = %self.handle.key(), "Registry slot already gone");
        }
    }
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        if !self.handle.state().is_terminal() {
            tracing::error!(
                requester = %self.handle.key(),
                "Job abandoned in state {}",
                self.handle.state()
            );
            let _ = self.handle.transition(JobEvent::Fail);
        }
        self.release();
        self.handle.settle();
    }
}
