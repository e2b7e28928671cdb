use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// One bounded slice of an artifact, 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPart {
    pub index: u32,
    pub total_parts: u32,
    /// Byte offsets into the original artifact
    pub byte_range: Range<u64>,
    /// Temporary file holding this part's bytes while it is sent
    pub local_path: PathBuf,
}

impl ArtifactPart {
    pub fn len(&self) -> u64 {
        self.byte_range.end - self.byte_range.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_last(&self) -> bool {
        self.index == self.total_parts
    }

    /// `"{stem}_part{i}of{n}{ext}"` derived from a whole-artifact file name
    pub fn file_name(&self, artifact_name: &str) -> String {
        let path = Path::new(artifact_name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| artifact_name.to_string());
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        format!("{}_part{}of{}{}", stem, self.index, self.total_parts, ext)
    }

    pub fn caption(&self) -> String {
        format!("Part {}/{}", self.index, self.total_parts)
    }
}
