//! Advisory locking of the snapshot across `jt` processes.
//!
//! A sidecar lock file sits next to the snapshot. Readers take it shared,
//! the writer takes it exclusive. Acquisition polls with a short backoff
//! until the configured wait runs out.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const FIRST_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_millis(50);

/// Failure to take the snapshot lock.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("{}: snapshot lock {} still held after {waited:?}", ErrorCode::LockContention, path.display())]
    Contended { path: PathBuf, waited: Duration },

    #[error("{}: cannot open lock file: {0}", ErrorCode::SnapshotWriteFailed)]
    Io(#[from] io::Error),
}

impl LockError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Contended { .. } => ErrorCode::LockContention,
            Self::Io(_) => ErrorCode::SnapshotWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Whether the holder reads or replaces the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

/// A held lock on the snapshot. Released on drop.
#[derive(Debug)]
pub struct SnapshotLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl SnapshotLock {
    /// Take the lock for reading. Readers share it but wait out a writer.
    ///
    /// # Errors
    ///
    /// [`LockError::Contended`] when a writer keeps it past `wait`, or
    /// [`LockError::Io`] when the lock file cannot be created.
    pub fn read(path: &Path, wait: Duration) -> Result<Self, LockError> {
        Self::acquire(path, LockMode::Read, wait)
    }

    /// Take the lock for writing, excluding every other holder.
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotLock::read`].
    pub fn write(path: &Path, wait: Duration) -> Result<Self, LockError> {
        Self::acquire(path, LockMode::Write, wait)
    }

    fn acquire(path: &Path, mode: LockMode, wait: Duration) -> Result<Self, LockError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let started = Instant::now();
        let mut backoff = FIRST_BACKOFF;
        loop {
            let taken = match mode {
                LockMode::Read => FileExt::try_lock_shared(&file),
                LockMode::Write => FileExt::try_lock_exclusive(&file),
            };
            if taken.is_ok() {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                    mode,
                });
            }

            let waited = started.elapsed();
            if waited >= wait {
                tracing::debug!(path = %path.display(), ?mode, ?waited, "snapshot lock contended");
                return Err(LockError::Contended {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(backoff.min(wait.saturating_sub(waited)));
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
