use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use streamdrop::{FetchError, FetchOptions, Fetcher, Metadata, ProgressEvent, ProgressSink};
use tokio::sync::Notify;

/// What `download` leaves behind
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Write `size` bytes to the destination
    Write(usize),
    /// Report success but write nothing
    Missing,
    /// Report success with an empty file
    Empty,
    Fail(FetchError),
}

/// Byte `i` of every scripted artifact
pub fn pattern(size: usize, seed: usize) -> Vec<u8> {
    (0..size).map(|i| ((i * 7 + seed) % 251) as u8).collect()
}

pub struct ScriptedFetcher {
    pub title: String,
    pub outcome: FetchOutcome,
    pub seed: usize,
    /// When set, `download` writes the first half then waits for a permit
    pub gate: Option<Arc<Notify>>,
    /// Signalled once `download` has started
    pub started: Arc<Notify>,
    pub resolves: AtomicUsize,
    pub downloads: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(outcome: FetchOutcome) -> Self {
        Self {
            title: "Evening News".to_string(),
            outcome,
            seed: 0,
            gate: None,
            started: Arc::new(Notify::new()),
            resolves: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn writing(size: usize) -> Self {
        Self::new(FetchOutcome::Write(size))
    }

    pub fn with_seed(mut self, seed: usize) -> Self {
        self.seed = seed;
        self
    }

    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn resolve(&self, source: &str, _options: &FetchOptions) -> Result<Metadata, FetchError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        // Metadata lookups take a round trip
        tokio::time::sleep(Duration::from_millis(5)).await;
        if source.is_empty() {
            return Err(FetchError::Unsupported("empty source".to_string()));
        }
        let mut metadata = Metadata::new(format!("id{}", self.seed), &self.title, "mp4");
        metadata.duration_secs = Some(61.0);
        Ok(metadata)
    }

    async fn download(
        &self,
        _source: &str,
        destination: &Path,
        _options: &FetchOptions,
        progress: ProgressSink,
    ) -> Result<PathBuf, FetchError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();

        let size = match &self.outcome {
            FetchOutcome::Write(size) => *size,
            FetchOutcome::Missing => return Ok(destination.with_extension("part.mp4")),
            FetchOutcome::Empty => {
                tokio::fs::write(destination, b"")
                    .await
                    .map_err(|e| FetchError::Network(e.to_string()))?;
                return Ok(destination.to_path_buf());
            }
            FetchOutcome::Fail(err) => return Err(err.clone()),
        };

        let data = pattern(size, self.seed);
        let half = size / 2;

        // Write and report from a blocking thread, like a real extractor
        let first = {
            let destination = destination.to_path_buf();
            let data = data[..half].to_vec();
            let progress = progress.clone();
            tokio::task::spawn_blocking(move || write_chunks(&destination, &data, 0, size, &progress))
        };
        first
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let second = {
            let destination = destination.to_path_buf();
            let data = data[half..].to_vec();
            tokio::task::spawn_blocking(move || {
                write_chunks(&destination, &data, half, size, &progress)
            })
        };
        second
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(destination.to_path_buf())
    }
}

fn write_chunks(
    destination: &Path,
    data: &[u8],
    offset: usize,
    total: usize,
    progress: &ProgressSink,
) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(destination)?;

    let mut written = offset;
    for chunk in data.chunks(4096) {
        file.write_all(chunk)?;
        written += chunk.len();
        progress.observe(ProgressEvent::new(written as u64, Some(total as u64)));
        std::thread::sleep(Duration::from_micros(200));
    }
    file.flush()
}
