use crate::registry::types::{JobEvent, JobState, RequesterKey};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Requester {0} already has an active job")]
    AlreadyActive(RequesterKey),

    #[error("Invalid job options: {0}")]
    InvalidOptions(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Cannot handle {event:?} in state {from:?}")]
    InvalidTransition { from: JobState, event: JobEvent },

    #[error("Cancellation requested, refusing {event:?} in state {from:?}")]
    CancelRequested { from: JobState, event: JobEvent },
}

pub type StateResult<T> = Result<T, StateError>;
