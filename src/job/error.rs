use crate::fetch::FetchError;
use crate::notify::NotifyError;
use crate::registry::StateError;
use crate::split::SplitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("Upload failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Cancelled by user")]
    CancelledByUser,
}

impl JobError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, JobError::CancelledByUser)
    }
}

pub type JobResult<T> = Result<T, JobError>;
