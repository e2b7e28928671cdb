use crate::notify::NotifyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid part size: {0}")]
    InvalidPartSize(u64),

    #[error("{file_size} bytes in parts of {max_part_bytes} needs more parts than can be numbered")]
    TooManyParts { file_size: u64, max_part_bytes: u64 },

    #[error("Cannot split an empty artifact")]
    EmptyArtifact,

    #[error("Part {index} short read: expected {expected} bytes, got {actual}")]
    ShortRead {
        index: u32,
        expected: u64,
        actual: u64,
    },

    #[error("Upload of part {index}/{total} failed: {source}")]
    Upload {
        index: u32,
        total: u32,
        #[source]
        source: NotifyError,
    },

    #[error("Stopped after {sent} part(s)")]
    Interrupted { sent: usize },
}

pub type SplitResult<T> = Result<T, SplitError>;
