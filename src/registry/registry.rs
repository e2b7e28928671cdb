use crate::registry::error::AdmissionError;
use crate::registry::types::{JobHandle, RequesterKey};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Map of requester -> live job, guarded by one mutex so that admit,
/// release and cancel are linearizable per key.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<RequesterKey, JobHandle>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a new job for `key` in state Pending, unless one is already live.
    pub fn try_admit(
        &self,
        key: &RequesterKey,
        correlation_id: impl Into<String>,
    ) -> Result<JobHandle, AdmissionError> {
        let mut jobs = self.jobs.lock();
        match jobs.entry(key.clone()) {
            Entry::Occupied(existing) => {
                tracing::debug!(
                    requester = %key,
                    active = existing.get().correlation_id(),
                    "admission refused"
                );
                Err(AdmissionError::AlreadyActive(key.clone()))
            }
            Entry::Vacant(slot) => {
                let handle = JobHandle::new(key.clone(), correlation_id.into());
                slot.insert(handle.clone());
                Ok(handle)
            }
        }
    }

    /// Remove the entry for `key`. Releasing an unknown key is a no-op.
    pub fn release(&self, key: &RequesterKey) -> Option<JobHandle> {
        self.jobs.lock().remove(key)
    }

    /// Remove the entry for `handle`'s key only if it is still that job.
    pub fn release_job(&self, handle: &JobHandle) -> bool {
        let mut jobs = self.jobs.lock();
        match jobs.entry(handle.key().clone()) {
            Entry::Occupied(entry) if entry.get().same_job(handle) => {
                entry.remove();
                true
            }
            _ => false,
        }
    }

    /// Flag the live job for `key` as cancelled.
    ///
    /// Returns false when there is no live job or it is already terminal.
    pub fn mark_cancelled(&self, key: &RequesterKey) -> bool {
        let jobs = self.jobs.lock();
        jobs.get(key).is_some_and(|handle| handle.request_cancel())
    }

    pub fn get(&self, key: &RequesterKey) -> Option<JobHandle> {
        self.jobs.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &RequesterKey) -> bool {
        self.jobs.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<RequesterKey> {
        self.jobs.lock().keys().cloned().collect()
    }
}
