//! Persisted "last successfully scanned" timestamp.
//!
//! The file holds a single RFC 3339 timestamp. Writes go to a sibling temp
//! file that is then renamed over the original, so readers never observe a
//! half-written checkpoint.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("checkpoint at {path} is not a valid timestamp: {value:?}")]
    Parse { path: String, value: String },
}

/// Owner of the single checkpoint timestamp.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
    lookback: Duration,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>, lookback: Duration) -> Self {
        Self {
            path: path.into(),
            lookback,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored timestamp; `Ok(None)` when no checkpoint exists yet.
    pub fn read(&self) -> Result<Option<DateTime<Utc>>, CheckpointError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CheckpointError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        let value = text.trim();
        DateTime::parse_from_rfc3339(value)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|_| CheckpointError::Parse {
                path: self.path.display().to_string(),
                value: value.to_string(),
            })
    }

    /// Current checkpoint, falling back to `now - lookback`.
    ///
    /// A missing checkpoint is created with the fallback value; an unreadable
    /// one is logged and left for the next successful cycle to overwrite.
    pub fn load(&self) -> DateTime<Utc> {
        let fallback = Utc::now() - self.lookback;
        match self.read() {
            Ok(Some(ts)) => ts,
            Ok(None) => {
                info!(
                    path = %self.path.display(),
                    checkpoint = %fallback.to_rfc3339(),
                    "no checkpoint found, starting from lookback window"
                );
                if let Err(e) = self.save(fallback) {
                    warn!(error = %e, "failed to create initial checkpoint");
                }
                fallback
            }
            Err(e) => {
                warn!(error = %e, "checkpoint unreadable, using lookback window");
                fallback
            }
        }
    }

    /// Atomically replace the stored timestamp.
    pub fn save(&self, ts: DateTime<Utc>) -> Result<(), CheckpointError> {
        write_atomic(&self.path, ts.to_rfc3339().as_bytes()).map_err(|source| {
            CheckpointError::Io {
                path: self.path.display().to_string(),
                source,
            }
        })
    }
}

/// Write `bytes` to `path` via a temp file and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}
