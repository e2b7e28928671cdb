use crate::fetch::error::FetchError;
use crate::progress::format_megabytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Fetcher tuning passed through untouched (format ladder, container, retries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub format: String,
    pub merge_output_format: Option<String>,
    /// Retries inside the fetcher itself; the job never retries a fetch.
    pub retries: u32,
    /// Anything else the concrete fetcher understands
    pub extra: BTreeMap<String, String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            format: "best".to_string(),
            merge_output_format: Some("mp4".to_string()),
            retries: 10,
            extra: BTreeMap::new(),
        }
    }
}

/// What `resolve` learns about a source before any bytes move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Stable content identifier, used for local file naming
    pub id: String,
    pub title: String,
    /// Without the leading dot
    pub extension: String,
    pub duration_secs: Option<f64>,
    /// As declared by the source; never trusted over the on-disk size
    pub declared_size: Option<u64>,
}

impl Metadata {
    pub fn new(id: impl Into<String>, title: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            extension: extension.into(),
            duration_secs: None,
            declared_size: None,
        }
    }

    /// Job-unique name inside the shared temp directory
    pub fn local_file_name(&self, job_tag: &str) -> String {
        let id = sanitize_file_name(&self.id);
        let id = if id.is_empty() { "artifact".to_string() } else { id };
        self.with_extension(&format!("{}-{}", sanitize_file_name(job_tag), id))
    }

    /// Name shown to the requester
    pub fn display_name(&self) -> String {
        let title = sanitize_file_name(&self.title);
        let title = if title.is_empty() { "video".to_string() } else { title };
        self.with_extension(&title)
    }

    fn with_extension(&self, stem: &str) -> String {
        let ext = sanitize_file_name(self.extension.trim_start_matches('.'));
        if ext.is_empty() {
            stem.to_string()
        } else {
            format!("{stem}.{ext}")
        }
    }
}

/// A fetched artifact whose size was read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub path: PathBuf,
    pub metadata: Metadata,
    pub size: u64,
}

impl FetchResult {
    /// Stat the downloaded file. A missing or empty file is a fetch failure.
    pub async fn inspect(path: PathBuf, metadata: Metadata) -> Result<Self, FetchError> {
        let stat = match tokio::fs::metadata(&path).await {
            Ok(stat) => stat,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FetchError::NotFound(format!(
                    "downloaded file missing at {}",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(FetchError::NotFound(format!(
                    "cannot stat {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if !stat.is_file() {
            return Err(FetchError::NotFound(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        if stat.len() == 0 {
            return Err(FetchError::EmptyResult(format!(
                "downloaded file {} is empty",
                path.display()
            )));
        }

        Ok(Self {
            path,
            metadata,
            size: stat.len(),
        })
    }

    pub fn is_oversized(&self, max_bytes: u64) -> bool {
        self.size > max_bytes
    }

    /// Caption for single-document delivery
    pub fn caption(&self) -> String {
        let mut caption = format!("{}\n{}", self.metadata.title, format_megabytes(self.size));
        if let Some(secs) = self.metadata.duration_secs.filter(|s| s.is_finite() && *s > 0.0) {
            let secs = secs.round() as u64;
            caption.push_str(&format!("\nDuration: {}:{:02}", secs / 60, secs % 60));
        }
        caption
    }
}

/// Replace path separators and control characters, trim dots and spaces.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}
