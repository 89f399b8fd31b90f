//! jobtrail-core library.
//!
//! The state-synchronization core of a job-search tracker: entity types,
//! a pure reducer over them, reminders derived from pipeline status, and
//! iCalendar export.
//!
//! # Conventions
//!
//! - **Errors**: pure functions never fail. I/O seams return
//!   `thiserror` enums that map to an [`error::ErrorCode`]; config loading
//!   uses `anyhow::Result`.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).
//!   Absorbed no-ops log at `warn`.
//! - **Time**: transitions take `now` as an argument. Only [`store`]
//!   reads a clock.

pub mod action;
pub mod config;
pub mod dates;
pub mod derive;
pub mod error;
pub mod ics;
pub mod lock;
pub mod model;
pub mod query;
pub mod reducer;
pub mod snapshot;
pub mod state;
pub mod store;

pub use action::{Action, ActionError, LoadData};
pub use error::ErrorCode;
pub use model::{
    CalendarEvent, ChatMessage, EntityId, EventKind, EventOrigin, Opportunity, Phase, Sender,
    Status, UserProfile, identities_match,
};
pub use reducer::reduce;
pub use snapshot::{SnapshotError, SnapshotStore};
pub use state::AppState;
pub use store::{Clock, FixedClock, Store, SystemClock};
