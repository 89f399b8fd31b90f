//! Entity types shared by the reducer, the generators, and the host shell.

pub mod calendar;
pub mod chat;
pub mod id;
pub mod opportunity;
pub mod profile;
pub mod status;

pub use calendar::{CalendarEvent, EventKind, EventOrigin, EventPatch};
pub use chat::{ChatMessage, ChatThreads, Sender};
pub use id::{EntityId, Identity, identities_match};
pub use opportunity::{Opportunity, OpportunityPatch};
pub use profile::{ProfilePatch, UserProfile};
pub use status::{Phase, Status};
