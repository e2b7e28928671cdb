use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::error::{SplitError, SplitResult};
use super::types::ArtifactPart;
use crate::metrics;
use crate::notify::NotifyError;

/// Receives parts in ascending order.
#[async_trait]
pub trait PartSink: Send + Sync {
    async fn deliver(&self, part: &ArtifactPart) -> Result<(), NotifyError>;

    /// Checked between parts; returning true stops before the next part.
    fn should_stop(&self) -> bool {
        false
    }
}

pub struct ArtifactSplitter {
    max_part_bytes: u64,
    part_delay: Duration,
}

impl ArtifactSplitter {
    pub fn new(max_part_bytes: u64, part_delay: Duration) -> SplitResult<Self> {
        if max_part_bytes == 0 {
            return Err(SplitError::InvalidPartSize(max_part_bytes));
        }
        Ok(Self {
            max_part_bytes,
            part_delay,
        })
    }

    pub fn max_part_bytes(&self) -> u64 {
        self.max_part_bytes
    }

    /// ceil(file_size / max_part_bytes)
    ///
    /// Fails when the count does not fit a part index.
    pub fn total_parts(&self, file_size: u64) -> SplitResult<u32> {
        let parts = file_size.div_ceil(self.max_part_bytes);
        u32::try_from(parts).map_err(|_| SplitError::TooManyParts {
            file_size,
            max_part_bytes: self.max_part_bytes,
        })
    }

    /// Lay out the parts of `artifact` without touching its bytes.
    ///
    /// Part files are placed next to the artifact and named after it.
    pub fn plan(&self, artifact: &Path, file_size: u64) -> SplitResult<Vec<ArtifactPart>> {
        if file_size == 0 {
            return Err(SplitError::EmptyArtifact);
        }

        let total_parts = self.total_parts(file_size)?;
        let dir = artifact.parent().unwrap_or_else(|| Path::new("."));
        let artifact_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "artifact".to_string());

        let parts = (0..total_parts)
            .map(|i| {
                let start = i as u64 * self.max_part_bytes;
                let end = std::cmp::min(start + self.max_part_bytes, file_size);
                let mut part = ArtifactPart {
                    index: i + 1,
                    total_parts,
                    byte_range: start..end,
                    local_path: dir.to_path_buf(),
                };
                part.local_path = dir.join(part.file_name(&artifact_name));
                part
            })
            .collect();

        Ok(parts)
    }

    /// Stream `parts` of `artifact` to `sink`, one part file at a time.
    ///
    /// Each part file is removed right after its delivery attempt, so at most
    /// one part sits on disk next to the artifact. Returns the number of
    /// parts delivered.
    pub async fn split_and_send(
        &self,
        artifact: &Path,
        parts: &[ArtifactPart],
        sink: &dyn PartSink,
    ) -> SplitResult<usize> {
        let mut source = File::open(artifact).await?;

        for (sent, part) in parts.iter().enumerate() {
            if sent > 0 {
                if !self.part_delay.is_zero() {
                    tokio::time::sleep(self.part_delay).await;
                }
                if sink.should_stop() {
                    tracing::info!("Stopping split after {} of {} parts", sent, parts.len());
                    return Err(SplitError::Interrupted { sent });
                }
            }

            if let Err(e) = Self::write_part(&mut source, part).await {
                remove_part(part).await;
                return Err(e);
            }

            let delivered = sink.deliver(part).await;
            remove_part(part).await;

            delivered.map_err(|source| SplitError::Upload {
                index: part.index,
                total: part.total_parts,
                source,
            })?;

            metrics::record_part_sent(part.len());
            tracing::debug!(
                "Sent part {}/{} ({} bytes)",
                part.index,
                part.total_parts,
                part.len()
            );
        }

        Ok(parts.len())
    }

    /// Copy the next `part.len()` bytes of `source` into the part file.
    async fn write_part(source: &mut File, part: &ArtifactPart) -> SplitResult<()> {
        let expected = part.len();
        let mut reader = source.take(expected);
        let mut output = File::create(&part.local_path).await?;

        let actual = tokio::io::copy(&mut reader, &mut output).await?;
        output.flush().await?;

        if actual != expected {
            return Err(SplitError::ShortRead {
                index: part.index,
                expected,
                actual,
            });
        }

        Ok(())
    }
}

async fn remove_part(part: &ArtifactPart) {
    match tokio::fs::remove_file(&part.local_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            "Failed to remove part file {}: {}",
            part.local_path.display(),
            e
        ),
    }
}
