use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Worth retrying (timeouts, flood control, connection resets).
    #[error("Transient notify failure: {0}")]
    Transient(String),

    /// Refused by the transport, e.g. payload too large.
    #[error("Rejected by transport: {0}")]
    Rejected(String),
}

impl NotifyError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotifyError::Transient(_))
    }
}

impl From<std::io::Error> for NotifyError {
    fn from(err: std::io::Error) -> Self {
        NotifyError::Transient(err.to_string())
    }
}

pub type NotifyResult<T> = Result<T, NotifyError>;
