//! Local files owned by one job.
//!
//! Every path a job may create is tracked before it can exist on disk and
//! removed on every exit path. If the job future is dropped or unwinds
//! before `cleanup` ran, `Drop` removes what is left.

use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct JobWorkspace {
    dir: PathBuf,
    owned: Mutex<Vec<PathBuf>>,
}

impl JobWorkspace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            owned: Mutex::new(Vec::new()),
        }
    }

    /// Shared temp directory; only tracked files inside it belong to this job.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn track(&self, path: &Path) {
        let mut owned = self.owned.lock();
        if !owned.iter().any(|p| p == path) {
            owned.push(path.to_path_buf());
        }
    }

    pub fn tracked(&self) -> Vec<PathBuf> {
        self.owned.lock().clone()
    }

    /// Remove every tracked file that still exists. Returns how many were removed.
    pub async fn cleanup(&self) -> usize {
        let paths = std::mem::take(&mut *self.owned.lock());
        let mut removed = 0;

        for path in paths {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    tracing::debug!("Removed {}", path.display());
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        removed
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        for path in self.owned.get_mut().drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!("Removed {} on drop", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}
