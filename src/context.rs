//! Build context: whether a run is incremental and which files changed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or saving incremental state.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("failed to access state file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed state file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// What the host build knows about previous runs.
pub trait BuildContext {
    /// Whether only changed files should be processed.
    fn is_incremental(&self) -> bool;

    /// Whether `path` changed since the last recorded run.
    fn has_delta(&self, path: &Path) -> bool;

    /// Notify the context that `path` was rewritten.
    fn refresh(&mut self, path: &Path);
}

/// A non-incremental build: every file is always processed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullBuild;

impl BuildContext for FullBuild {
    fn is_incremental(&self) -> bool {
        false
    }

    fn has_delta(&self, _path: &Path) -> bool {
        true
    }

    fn refresh(&mut self, _path: &Path) {}
}

/// Size and modification time of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub len: u64,
    pub modified_secs: u64,
    pub modified_nanos: u32,
}

impl Fingerprint {
    /// Fingerprint of a file on disk, `None` if it cannot be read.
    pub fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        let modified = meta.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
        Some(Self {
            len: meta.len(),
            modified_secs: modified.as_secs(),
            modified_nanos: modified.subsec_nanos(),
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct State {
    #[serde(default)]
    files: BTreeMap<PathBuf, Fingerprint>,
}

/// Incremental context backed by a JSON file of fingerprints.
#[derive(Debug)]
pub struct DeltaTracker {
    state_path: PathBuf,
    previous: State,
    current: State,
}

impl DeltaTracker {
    /// Open the state file. A missing file means nothing was recorded yet.
    pub fn open<P: AsRef<Path>>(state_path: P) -> Result<Self, StateError> {
        let state_path = state_path.as_ref().to_path_buf();
        let previous: State = match fs::read_to_string(&state_path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| StateError::Json {
                path: state_path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::default(),
            Err(source) => {
                return Err(StateError::Io {
                    path: state_path,
                    source,
                })
            }
        };
        debug!(path = %state_path.display(), files = previous.files.len(), "loaded incremental state");

        Ok(Self {
            state_path,
            previous,
            current: State::default(),
        })
    }

    /// Record the current fingerprint of `path` for the next run.
    pub fn record(&mut self, path: &Path) {
        match Fingerprint::of(path) {
            Some(fingerprint) => {
                self.current.files.insert(path.to_path_buf(), fingerprint);
            }
            None => {
                self.current.files.remove(path);
            }
        }
    }

    /// Forget `path`, so the next run treats it as changed.
    pub fn forget(&mut self, path: &Path) {
        self.current.files.remove(path);
    }

    /// Persist the fingerprints recorded during this run.
    pub fn save(&self) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(&self.current).map_err(|source| StateError::Json {
            path: self.state_path.clone(),
            source,
        })?;
        fs::write(&self.state_path, json).map_err(|source| StateError::Io {
            path: self.state_path.clone(),
            source,
        })
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }
}

impl BuildContext for DeltaTracker {
    fn is_incremental(&self) -> bool {
        true
    }

    fn has_delta(&self, path: &Path) -> bool {
        match (self.previous.files.get(path), Fingerprint::of(path)) {
            (Some(before), Some(now)) => *before != now,
            _ => true,
        }
    }

    fn refresh(&mut self, path: &Path) {
        self.record(path);
    }
}
