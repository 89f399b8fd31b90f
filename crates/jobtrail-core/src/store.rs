//! The explicit store object.
//!
//! A [`Store`] owns the current tree, the clock that feeds `now` into the
//! reducer, and optionally the snapshot it persists to. Persistence is
//! explicit: nothing is written until [`Store::save`] is called.

use crate::action::Action;
use crate::reducer::reduce;
use crate::snapshot::{SnapshotError, SnapshotStore};
use crate::state::AppState;
use chrono::{DateTime, Utc};

/// Source of the current time for transitions.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug)]
pub struct Store<C: Clock = SystemClock> {
    state: AppState,
    clock: C,
    snapshots: Option<SnapshotStore>,
}

impl Store<SystemClock> {
    /// An empty store with no snapshot behind it.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(AppState::default(), SystemClock)
    }

    /// Open the store backed by `snapshots`, loading whatever it holds.
    ///
    /// # Errors
    ///
    /// Propagates [`SnapshotError`] from the initial load.
    pub fn open(snapshots: SnapshotStore) -> Result<Self, SnapshotError> {
        Self::open_with_clock(snapshots, SystemClock)
    }
}

impl<C: Clock> Store<C> {
    /// Wrap an existing tree. The tree is made consistent first.
    #[must_use]
    pub fn new(state: AppState, clock: C) -> Self {
        Self {
            state: state.into_consistent(),
            clock,
            snapshots: None,
        }
    }

    /// Open a snapshot-backed store with an explicit clock.
    ///
    /// # Errors
    ///
    /// Propagates [`SnapshotError`] from the initial load.
    pub fn open_with_clock(snapshots: SnapshotStore, clock: C) -> Result<Self, SnapshotError> {
        let state = snapshots.load()?;
        Ok(Self {
            state,
            clock,
            snapshots: Some(snapshots),
        })
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub const fn snapshots(&self) -> Option<&SnapshotStore> {
        self.snapshots.as_ref()
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run one action through the reducer and keep the result.
    pub fn dispatch(&mut self, action: Action) -> &AppState {
        let next = reduce(&self.state, action, self.clock.now());
        self.state = next;
        &self.state
    }

    /// Decode a raw action document leniently and dispatch it.
    pub fn dispatch_json(&mut self, raw: &str) -> &AppState {
        self.dispatch(Action::decode(raw))
    }

    /// Write the current tree to the snapshot. A store without a
    /// snapshot saves nothing.
    ///
    /// # Errors
    ///
    /// Propagates [`SnapshotError`] from the write.
    pub fn save(&self) -> Result<(), SnapshotError> {
        match &self.snapshots {
            Some(snapshots) => snapshots.save(&self.state),
            None => Ok(()),
        }
    }

    /// Replace the in-memory tree with the snapshot contents.
    ///
    /// # Errors
    ///
    /// Propagates [`SnapshotError`] from the read. The in-memory tree is
    /// untouched on failure.
    pub fn load(&mut self) -> Result<&AppState, SnapshotError> {
        if let Some(snapshots) = &self.snapshots {
            self.state = snapshots.load()?;
        }
        Ok(&self.state)
    }
}
