//! Durable snapshot of the state tree.
//!
//! The snapshot is one pretty-printed JSON document. Writes go to a
//! sibling temp file which is then renamed over the target, so a crash
//! mid-write leaves the previous snapshot intact. A sidecar `.lock` file
//! serializes writers against readers across processes.

use crate::error::ErrorCode;
use crate::lock::{LockError, SnapshotLock};
use crate::state::AppState;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default snapshot lock wait.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2000);

/// Failure reading or writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("snapshot {} is not a valid state document: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write snapshot {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl SnapshotError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Corrupt { .. } => ErrorCode::CorruptSnapshot,
            Self::Write { .. } => ErrorCode::SnapshotWriteFailed,
            Self::Serialize(_) => ErrorCode::InternalUnexpected,
            Self::Lock(err) => err.code(),
        }
    }
}

/// Location and locking policy of one snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl SnapshotStore {
    /// Snapshot `file_name` inside `dir`.
    #[must_use]
    pub fn new(dir: &Path, file_name: &str) -> Self {
        let path = dir.join(file_name);
        let lock_path = dir.join(format!("{file_name}.lock"));
        Self {
            path,
            lock_path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the snapshot. A missing file yields the empty default tree.
    ///
    /// The returned tree has been through [`AppState::into_consistent`].
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Corrupt`] when the file is not a state
    /// document, [`SnapshotError::Read`] on I/O failure, or
    /// [`SnapshotError::Lock`] when a writer holds the lock too long.
    pub fn load(&self) -> Result<AppState, SnapshotError> {
        let state = self.load_raw()?.into_consistent();
        debug!(
            path = %self.path.display(),
            opportunities = state.opportunities.len(),
            events = state.events.len(),
            "snapshot loaded"
        );
        Ok(state)
    }

    /// Read the snapshot exactly as stored: the index is rebuilt but
    /// orphans are kept, so [`AppState::check_integrity`] can report them.
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotStore::load`].
    pub fn load_raw(&self) -> Result<AppState, SnapshotError> {
        if !self.exists() {
            debug!(path = %self.path.display(), "no snapshot, starting empty");
            return Ok(AppState::default());
        }

        let _lock = SnapshotLock::read(&self.lock_path, self.lock_timeout)?;
        let raw = fs::read_to_string(&self.path).map_err(|source| SnapshotError::Read {
            path: self.path.clone(),
            source,
        })?;

        if raw.trim().is_empty() {
            debug!(path = %self.path.display(), "empty snapshot, starting empty");
            return Ok(AppState::default());
        }

        let mut state: AppState =
            serde_json::from_str(&raw).map_err(|source| SnapshotError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        state.reindex();
        Ok(state)
    }

    /// Atomically replace the snapshot with `state`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Write`] on I/O failure or
    /// [`SnapshotError::Lock`] when the lock cannot be taken in time.
    pub fn save(&self, state: &AppState) -> Result<(), SnapshotError> {
        let body = serde_json::to_string_pretty(state).map_err(SnapshotError::Serialize)?;

        let _lock = SnapshotLock::write(&self.lock_path, self.lock_timeout)?;
        let write_err = |source| SnapshotError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(body.as_bytes()).map_err(write_err)?;
        file.write_all(b"\n").map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(write_err)?;

        info!(
            path = %self.path.display(),
            opportunities = state.opportunities.len(),
            events = state.events.len(),
            "snapshot saved"
        );
        Ok(())
    }
}
