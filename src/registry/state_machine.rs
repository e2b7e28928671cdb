use crate::registry::error::{StateError, StateResult};
use crate::registry::types::{JobEvent, JobState};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Job state plus its cancellation flag.
///
/// Both are only written under the watch channel's lock, so a cancellation
/// accepted by `request_cancel` is never followed by forward progress.
pub struct JobStateMachine {
    state: watch::Sender<JobState>,
    cancel_requested: AtomicBool,
}

impl Default for JobStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStateMachine {
    pub fn new() -> Self {
        let (state, _) = watch::channel(JobState::Pending);
        Self {
            state,
            cancel_requested: AtomicBool::new(false),
        }
    }

    /// Get current state
    pub fn current_state(&self) -> JobState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state.subscribe()
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }

    /// Flag the job for cancellation unless it is already terminal.
    pub fn request_cancel(&self) -> bool {
        let mut accepted = false;
        self.state.send_if_modified(|state| {
            if state.is_cancellable() {
                self.cancel_requested.store(true, Ordering::Release);
                accepted = true;
            }
            false
        });
        accepted
    }

    /// Transition state based on event.
    ///
    /// Once cancellation was requested only `Cancel` and `Fail` are accepted.
    pub fn transition(&self, event: JobEvent) -> StateResult<JobState> {
        let mut outcome = Err(StateError::InvalidTransition {
            from: JobState::Pending,
            event,
        });

        self.state.send_if_modified(|state| {
            let next = if event.is_forward() && self.cancel_requested.load(Ordering::Acquire) {
                Err(StateError::CancelRequested { from: *state, event })
            } else {
                Self::next(*state, event)
            };
            match next {
                Ok(next) => {
                    *state = next;
                    outcome = Ok(next);
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });

        outcome
    }

    fn next(state: JobState, event: JobEvent) -> StateResult<JobState> {
        let next = match (state, event) {
            (JobState::Pending, JobEvent::Start) => JobState::Analyzing,

            (JobState::Analyzing, JobEvent::MetadataResolved) => JobState::Fetching,

            (JobState::Fetching, JobEvent::FetchCompleted { oversized: true }) => {
                JobState::Splitting
            }
            (JobState::Fetching, JobEvent::FetchCompleted { oversized: false }) => {
                JobState::Uploading
            }

            (JobState::Splitting | JobState::Uploading, JobEvent::Delivered) => {
                JobState::Completed
            }

            (from, JobEvent::Cancel) if !from.is_terminal() => JobState::Cancelled,
            (from, JobEvent::Fail) if !from.is_terminal() => JobState::Failed,

            (from, event) => return Err(StateError::InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
