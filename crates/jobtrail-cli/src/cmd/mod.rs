//! Command handlers for `jt`.
//!
//! Each handler opens a [`Session`], turns its arguments into at most one
//! action, commits it (dispatch then save), and renders the result.

pub mod chat;
pub mod completions;
pub mod dispatch;
pub mod doctor;
pub mod event;
pub mod export;
pub mod list;
pub mod load;
pub mod opportunity;
pub mod profile;
pub mod show;
pub mod summary;

use crate::output::{OutputMode, fail};
use anyhow::Context;
use chrono::{DateTime, Utc};
use jobtrail_core::config::EffectiveConfig;
use jobtrail_core::ics::ExportOptions;
use jobtrail_core::{Action, AppState, CalendarEvent, Clock, EntityId, ErrorCode, Opportunity, SnapshotStore, Store};

/// Clock for the CLI: the wall clock, or a pinned instant from
/// `JOBTRAIL_NOW` so runs can be reproduced.
#[derive(Debug, Clone, Copy)]
pub enum CliClock {
    System,
    Pinned(DateTime<Utc>),
}

impl CliClock {
    pub fn from_env(raw: Option<&str>) -> Self {
        match raw.and_then(jobtrail_core::dates::parse_datetime) {
            Some(at) => Self::Pinned(at),
            None => Self::System,
        }
    }
}

impl Clock for CliClock {
    fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Pinned(at) => *at,
        }
    }
}

/// Everything a command needs: the resolved output mode, export knobs,
/// and the snapshot-backed store.
pub struct Session {
    pub output: OutputMode,
    pub export: ExportOptions,
    pub snapshots: SnapshotStore,
    pub store: Store<CliClock>,
}

impl Session {
    /// Open the store described by `config`.
    pub fn open(config: &EffectiveConfig, output: OutputMode, clock: CliClock) -> anyhow::Result<Self> {
        let snapshots = SnapshotStore::new(&config.data_dir, &config.config.store.snapshot_file)
            .with_lock_timeout(config.config.store.lock_timeout());

        let store = match Store::open_with_clock(snapshots.clone(), clock) {
            Ok(store) => store,
            Err(err) => return fail(output, err.code(), err.to_string()),
        };
        tracing::debug!(path = %snapshots.path().display(), "session opened");

        Ok(Self {
            output,
            export: config.config.export.clone(),
            snapshots,
            store,
        })
    }

    pub const fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.store.now()
    }

    /// Dispatch `action` and persist the result.
    pub fn commit(&mut self, action: Action) -> anyhow::Result<&AppState> {
        let tag = action.tag();
        self.store.dispatch(action);
        if let Err(err) = self.store.save() {
            return fail(self.output, err.code(), err.to_string());
        }
        tracing::debug!(action = tag, "committed");
        Ok(self.store.state())
    }

    /// Look up an opportunity, failing with a coded error when absent.
    pub fn require_opportunity(&self, raw: &str) -> anyhow::Result<&Opportunity> {
        let id = EntityId::new(raw);
        match self.store.state().opportunity(&id) {
            Some(opportunity) => Ok(opportunity),
            None => fail(
                self.output,
                ErrorCode::OpportunityNotFound,
                format!("opportunity '{raw}' not found"),
            ),
        }
    }

    /// Look up an event, failing with a coded error when absent.
    pub fn require_event(&self, raw: &str) -> anyhow::Result<&CalendarEvent> {
        let id = EntityId::new(raw);
        match self.store.state().event(&id) {
            Some(event) => Ok(event),
            None => fail(
                self.output,
                ErrorCode::EventNotFound,
                format!("event '{raw}' not found"),
            ),
        }
    }
}

/// Read a file argument, with `-` meaning stdin.
pub fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        return std::io::read_to_string(std::io::stdin()).context("Failed to read stdin");
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
}
