//! Fetcher for local files (`file://` URLs or plain paths).
//!
//! The copy runs on a blocking thread and reports progress from there.

use crate::fetch::{FetchError, FetchOptions, Fetcher, Metadata};
use crate::progress::{ProgressEvent, ProgressSink};
use async_trait::async_trait;
use std::fs::File;
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

const DEFAULT_BUFFER_SIZE: usize = 256 * 1024;

pub struct LocalFileFetcher {
    buffer_size: usize,
}

impl Default for LocalFileFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalFileFetcher {
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    fn source_path(source: &str) -> Result<PathBuf, FetchError> {
        let source = source.trim();
        if let Some(path) = source.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if source.contains("://") {
            return Err(FetchError::Unsupported(source.to_string()));
        }
        Ok(PathBuf::from(source))
    }
}

#[async_trait]
impl Fetcher for LocalFileFetcher {
    async fn resolve(&self, source: &str, _options: &FetchOptions) -> Result<Metadata, FetchError> {
        let path = Self::source_path(source)?;
        let stat = tokio::fs::metadata(&path)
            .await
            .map_err(|e| map_io(&path, e))?;
        if !stat.is_file() {
            return Err(FetchError::Unsupported(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let canonical = tokio::fs::canonicalize(&path)
            .await
            .map_err(|e| map_io(&path, e))?;
        let digest = blake3::hash(canonical.to_string_lossy().as_bytes());
        let id = digest.to_hex().as_str()[..16].to_string();

        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| id.clone());
        let extension = path
            .extension()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "bin".to_string());

        let mut metadata = Metadata::new(id, title, extension);
        metadata.declared_size = Some(stat.len());
        Ok(metadata)
    }

    async fn download(
        &self,
        source: &str,
        destination: &Path,
        _options: &FetchOptions,
        progress: ProgressSink,
    ) -> Result<PathBuf, FetchError> {
        let source = Self::source_path(source)?;
        let destination = destination.to_path_buf();
        let buffer_size = self.buffer_size;

        tokio::task::spawn_blocking(move || {
            copy_with_progress(&source, &destination, buffer_size, &progress)
                .map_err(|e| map_io(&source, e))?;
            Ok::<_, FetchError>(destination)
        })
        .await
        .map_err(|e| FetchError::Network(format!("copy task failed: {e}")))?
    }
}

fn copy_with_progress(
    source: &Path,
    destination: &Path,
    buffer_size: usize,
    progress: &ProgressSink,
) -> io::Result<u64> {
    let mut input = File::open(source)?;
    let total = input.metadata()?.len();
    let mut output = File::create(destination)?;

    let start = Instant::now();
    let mut buffer = vec![0u8; buffer_size];
    let mut copied = 0u64;

    loop {
        let n = input.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        output.write_all(&buffer[..n])?;
        copied += n as u64;

        let mut event = ProgressEvent::new(copied, Some(total));
        let secs = start.elapsed().as_secs_f64();
        if secs > 0.0 {
            event = event.with_speed(copied as f64 / secs);
        }
        progress.observe(event);
    }

    output.flush()?;
    Ok(copied)
}

fn map_io(path: &Path, err: io::Error) -> FetchError {
    match err.kind() {
        ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
        _ => FetchError::Network(format!("{}: {}", path.display(), err)),
    }
}
