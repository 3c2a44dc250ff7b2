//! Failure snapshot persisted between runs.
//!
//! Each run records which targets were failing. The next run with
//! notifications enabled loads that set to decide which failures are new.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::classify::FailureRecord;

const SNAPSHOT_VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("No previous snapshot at {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Snapshot {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("Could not read snapshot {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not write snapshot {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StateError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Set of target keys (URLs) that were failing in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureKeySet(BTreeSet<String>);

impl FailureKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_failures(failures: &[FailureRecord]) -> Self {
        failures.iter().map(|f| f.key.clone()).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for FailureKeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u8,
    saved_at: DateTime<Utc>,
    failures: FailureKeySet,
}

/// File-backed store for the previous run's [`FailureKeySet`].
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_previous(&self) -> Result<FailureKeySet, StateError> {
        let bytes = std::fs::read(&self.path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                StateError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                StateError::Read {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        let snapshot: Snapshot = bincode::deserialize(&bytes).map_err(|e| StateError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StateError::Corrupt {
                path: self.path.clone(),
                reason: format!("unsupported snapshot version {}", snapshot.version),
            });
        }

        debug!(
            path = %self.path.display(),
            keys = snapshot.failures.len(),
            saved_at = %snapshot.saved_at,
            "Loaded previous snapshot"
        );
        Ok(snapshot.failures)
    }

    /// Overwrites the snapshot with `keys`, going through a `.tmp` sibling so
    /// a failed write never leaves a truncated file behind.
    pub fn save(&self, keys: &FailureKeySet) -> Result<(), StateError> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            failures: keys.clone(),
        };
        let bytes = bincode::serialize(&snapshot).map_err(|e| StateError::Write {
            path: self.path.clone(),
            source: std::io::Error::new(ErrorKind::InvalidData, e.to_string()),
        })?;

        let tmp = self.tmp_path();
        let write_err = |source| StateError::Write {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&tmp, &bytes).map_err(write_err)?;
        if let Err(source) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(write_err(source));
        }

        info!(path = %self.path.display(), keys = keys.len(), "Saved failure snapshot");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
