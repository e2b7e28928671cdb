pub mod error;
pub mod splitter;
pub mod types;

pub use error::{SplitError, SplitResult};
pub use splitter::{ArtifactSplitter, PartSink};
pub use types::ArtifactPart;
