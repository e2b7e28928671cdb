use crate::fetch::FetchOptions;
use crate::notify::StatusRetry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MAX_PART_BYTES: u64 = 49 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid option {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Per-job tuning, supplied at submit time or taken from the manager defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    /// Artifacts larger than this are split into parts of at most this size.
    pub max_part_bytes: u64,
    /// Minimum gap between two throttled status updates.
    pub progress_interval_secs: f64,
    /// Total attempts per status update, including the first.
    pub notify_retry_count: u32,
    pub notify_retry_delay_secs: f64,
    /// Pause between part uploads.
    pub part_delay_secs: f64,
    /// Handed to the fetcher as-is.
    pub fetch: FetchOptions,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            max_part_bytes: DEFAULT_MAX_PART_BYTES,
            progress_interval_secs: 1.0,
            notify_retry_count: 3,
            notify_retry_delay_secs: 1.0,
            part_delay_secs: 1.0,
            fetch: FetchOptions::default(),
        }
    }
}

impl JobOptions {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_part_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_part_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.notify_retry_count == 0 {
            return Err(ConfigError::Invalid {
                field: "notify_retry_count",
                reason: "must allow at least one attempt".to_string(),
            });
        }
        check_secs("progress_interval_secs", self.progress_interval_secs, false)?;
        check_secs("notify_retry_delay_secs", self.notify_retry_delay_secs, true)?;
        check_secs("part_delay_secs", self.part_delay_secs, true)?;
        Ok(())
    }

    pub fn progress_interval(&self) -> Duration {
        secs(self.progress_interval_secs)
    }

    pub fn part_delay(&self) -> Duration {
        secs(self.part_delay_secs)
    }

    pub fn status_retry(&self) -> StatusRetry {
        StatusRetry::new(self.notify_retry_count, secs(self.notify_retry_delay_secs))
    }
}

fn check_secs(field: &'static str, value: f64, allow_zero: bool) -> ConfigResult<()> {
    let ok = value.is_finite() && (value > 0.0 || (allow_zero && value == 0.0));
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is not a valid number of seconds"),
        })
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Manager-wide settings, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Shared scratch directory for fetched artifacts and part files.
    pub temp_dir: PathBuf,
    /// Options used when a submission does not bring its own.
    pub defaults: JobOptions,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().join("streamdrop"),
            defaults: JobOptions::default(),
        }
    }
}

impl ManagerConfig {
    pub fn from_toml_str(data: &str) -> ConfigResult<Self> {
        let config: ManagerConfig = toml::from_str(data)?;
        config.defaults.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(data) => Self::from_toml_str(&data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
