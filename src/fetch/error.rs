use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unsupported source: {0}")]
    Unsupported(String),

    #[error("Empty result: {0}")]
    EmptyResult(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NotFound(_) => "not_found",
            FetchError::Network(_) => "network",
            FetchError::Unsupported(_) => "unsupported",
            FetchError::EmptyResult(_) => "empty_result",
        }
    }
}
