//! Fetcher capability: resolve a source and download it to local storage.

pub mod error;
pub mod local;
pub mod types;

pub use error::FetchError;
pub use local::LocalFileFetcher;
pub use types::{FetchOptions, FetchResult, Metadata};

use crate::progress::ProgressSink;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Retrieves remote artifacts.
///
/// `resolve` must not transfer any payload bytes. `download` writes to
/// `destination` (or a sibling path, e.g. after container merging) and
/// returns where the artifact actually ended up. Progress may be reported
/// through `progress` from any thread.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn resolve(&self, source: &str, options: &FetchOptions) -> Result<Metadata, FetchError>;

    async fn download(
        &self,
        source: &str,
        destination: &Path,
        options: &FetchOptions,
        progress: ProgressSink,
    ) -> Result<PathBuf, FetchError>;
}
