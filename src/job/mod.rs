//! One download job driven from admission to a terminal state.

pub mod error;
pub mod job;
pub mod types;
pub mod workspace;

pub use error::{JobError, JobResult};
pub use job::DownloadJob;
pub use types::{terminal_text, JobReport};
pub use workspace::JobWorkspace;
