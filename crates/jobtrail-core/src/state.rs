//! The state tree owned by the reducer.
//!
//! Three correlated collections (opportunities, calendar events, chat
//! threads) plus profile data. Events point back at opportunities by id;
//! the [`EventIndex`] maps each opportunity to the events that reference
//! it so that cascades are a lookup rather than a scan. The index is
//! rebuilt from the flat event list and never serialized.

use crate::model::{
    CalendarEvent, ChatMessage, ChatThreads, EntityId, Opportunity, UserProfile, identities_match,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Opportunity id -> ids of the events that reference it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventIndex {
    by_opportunity: BTreeMap<EntityId, BTreeSet<EntityId>>,
}

impl EventIndex {
    /// Build the index from a flat event list.
    #[must_use]
    pub fn build(events: &[CalendarEvent]) -> Self {
        let mut by_opportunity: BTreeMap<EntityId, BTreeSet<EntityId>> = BTreeMap::new();
        for event in events {
            if let Some(owner) = &event.opportunity_id {
                by_opportunity
                    .entry(owner.clone())
                    .or_default()
                    .insert(event.id.clone());
            }
        }
        Self { by_opportunity }
    }

    /// Ids of the events referencing `opportunity`.
    #[must_use]
    pub fn events_for(&self, opportunity: &EntityId) -> Option<&BTreeSet<EntityId>> {
        self.by_opportunity.get(opportunity)
    }

    /// Opportunity ids with at least one referencing event.
    pub fn owners(&self) -> impl Iterator<Item = &EntityId> {
        self.by_opportunity.keys()
    }
}

/// The whole state tree. Cloning produces an independent snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppState {
    pub opportunities: Vec<Opportunity>,
    pub events: Vec<CalendarEvent>,
    pub chat_messages: ChatThreads,
    pub master_resume: String,
    pub user_profile: UserProfile,
    #[serde(skip)]
    pub(crate) index: EventIndex,
}

impl PartialEq for AppState {
    fn eq(&self, other: &Self) -> bool {
        self.opportunities == other.opportunities
            && self.events == other.events
            && self.chat_messages == other.chat_messages
            && self.master_resume == other.master_resume
            && self.user_profile == other.user_profile
    }
}

impl Eq for AppState {}

/// Counts of records dropped by [`AppState::prune_orphans`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub events: usize,
    pub threads: usize,
}

impl PruneReport {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.events == 0 && self.threads == 0
    }
}

/// A broken invariant found by [`AppState::check_integrity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    /// An event references an opportunity that does not exist.
    DanglingEvent { event: EntityId, opportunity: EntityId },
    /// A chat thread has no owning opportunity.
    OrphanThread { opportunity: EntityId },
    /// Two opportunities share an identity.
    DuplicateOpportunity { id: EntityId },
    /// Two events share an identity.
    DuplicateEvent { id: EntityId },
    /// The event index disagrees with the event list.
    StaleIndex,
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingEvent { event, opportunity } => {
                write!(f, "event {event} references missing opportunity {opportunity}")
            }
            Self::OrphanThread { opportunity } => {
                write!(f, "chat thread {opportunity} has no opportunity")
            }
            Self::DuplicateOpportunity { id } => write!(f, "opportunity id {id} is not unique"),
            Self::DuplicateEvent { id } => write!(f, "event id {id} is not unique"),
            Self::StaleIndex => f.write_str("event index is out of date"),
        }
    }
}

impl AppState {
    /// Take a deserialized or hand-built tree and restore its derived
    /// parts: drop repeated ids, drop orphans, rebuild the index.
    #[must_use]
    pub fn into_consistent(mut self) -> Self {
        let duplicates = self.dedupe_ids();
        if duplicates > 0 {
            tracing::warn!(duplicates, "dropped records with repeated ids");
        }
        let report = self.prune_orphans();
        if !report.is_empty() {
            tracing::warn!(
                events = report.events,
                threads = report.threads,
                "pruned records without an owning opportunity"
            );
        }
        self
    }

    #[must_use]
    pub fn opportunity(&self, id: &EntityId) -> Option<&Opportunity> {
        self.opportunities
            .iter()
            .find(|opp| identities_match(&opp.id, id))
    }

    pub(crate) fn opportunity_mut(&mut self, id: &EntityId) -> Option<&mut Opportunity> {
        self.opportunities
            .iter_mut()
            .find(|opp| identities_match(&opp.id, id))
    }

    #[must_use]
    pub fn contains_opportunity(&self, id: &EntityId) -> bool {
        self.opportunity(id).is_some()
    }

    #[must_use]
    pub fn event(&self, id: &EntityId) -> Option<&CalendarEvent> {
        self.events.iter().find(|event| identities_match(&event.id, id))
    }

    #[must_use]
    pub fn contains_event(&self, id: &EntityId) -> bool {
        self.event(id).is_some()
    }

    /// Events referencing `opportunity`, in collection order.
    #[must_use]
    pub fn events_for(&self, opportunity: &EntityId) -> Vec<&CalendarEvent> {
        let Some(ids) = self.index.events_for(opportunity) else {
            return Vec::new();
        };
        self.events
            .iter()
            .filter(|event| ids.contains(&event.id) && references(event, opportunity))
            .collect()
    }

    /// The chat thread owned by `opportunity` (empty when there is none).
    #[must_use]
    pub fn thread(&self, opportunity: &EntityId) -> &[ChatMessage] {
        self.chat_messages
            .get(opportunity)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.chat_messages.values().map(Vec::len).sum()
    }

    #[must_use]
    pub const fn index(&self) -> &EventIndex {
        &self.index
    }

    /// Rebuild the event index from the flat event list.
    pub fn reindex(&mut self) {
        self.index = EventIndex::build(&self.events);
    }

    /// Keep the first opportunity and the first event for each id.
    /// Returns how many records were dropped.
    pub fn dedupe_ids(&mut self) -> usize {
        let dropped = dedupe_by_id(&mut self.opportunities, |opp| &opp.id)
            + dedupe_by_id(&mut self.events, |event| &event.id);
        if dropped > 0 {
            self.reindex();
        }
        dropped
    }

    /// Drop events and chat threads whose opportunity no longer exists,
    /// then rebuild the index.
    pub fn prune_orphans(&mut self) -> PruneReport {
        let live: BTreeSet<EntityId> = self.opportunities.iter().map(|o| o.id.clone()).collect();

        let events_before = self.events.len();
        self.events.retain(|event| {
            event
                .opportunity_id
                .as_ref()
                .is_none_or(|owner| live.contains(owner))
        });

        let threads_before = self.chat_messages.len();
        self.chat_messages.retain(|owner, _| live.contains(owner));

        self.reindex();
        PruneReport {
            events: events_before - self.events.len(),
            threads: threads_before - self.chat_messages.len(),
        }
    }

    /// List every broken invariant. An empty list means the tree is
    /// internally consistent.
    #[must_use]
    pub fn check_integrity(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        let mut seen = BTreeSet::new();
        for opp in &self.opportunities {
            if !seen.insert(opp.id.clone()) {
                issues.push(IntegrityIssue::DuplicateOpportunity { id: opp.id.clone() });
            }
        }

        let mut seen_events = BTreeSet::new();
        for event in &self.events {
            if !seen_events.insert(event.id.clone()) {
                issues.push(IntegrityIssue::DuplicateEvent {
                    id: event.id.clone(),
                });
            }
            if let Some(owner) = &event.opportunity_id
                && !self.contains_opportunity(owner)
            {
                issues.push(IntegrityIssue::DanglingEvent {
                    event: event.id.clone(),
                    opportunity: owner.clone(),
                });
            }
        }

        for owner in self.chat_messages.keys() {
            if !self.contains_opportunity(owner) {
                issues.push(IntegrityIssue::OrphanThread {
                    opportunity: owner.clone(),
                });
            }
        }

        if self.index != EventIndex::build(&self.events) {
            issues.push(IntegrityIssue::StaleIndex);
        }

        issues
    }
}

/// Whether `event` carries a back-reference to `opportunity`.
pub(crate) fn references(event: &CalendarEvent, opportunity: &EntityId) -> bool {
    event
        .opportunity_id
        .as_ref()
        .is_some_and(|owner| identities_match(owner, opportunity))
}

fn dedupe_by_id<T>(items: &mut Vec<T>, id_of: impl Fn(&T) -> &EntityId) -> usize {
    let before = items.len();
    let mut seen = BTreeSet::new();
    items.retain(|item| seen.insert(id_of(item).clone()));
    before - items.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventKind;

    fn sample() -> AppState {
        let mut state = AppState {
            opportunities: vec![Opportunity::new(1_u64, "Acme", "Engineer")],
            events: vec![
                CalendarEvent::new("e1", "Call", "2024-01-02", EventKind::General).attached_to(1_u64),
                CalendarEvent::new("e2", "Gym", "2024-01-02", EventKind::General),
            ],
            ..AppState::default()
        };
        state.reindex();
        state
    }

    #[test]
    fn index_tracks_back_references() {
        let state = sample();
        let ids = state.index().events_for(&EntityId::from(1_u64)).expect("indexed");
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&EntityId::new("e1")));
        assert_eq!(state.events_for(&EntityId::new("1")).len(), 1);
        assert_eq!(state.index().owners().count(), 1);
    }

    #[test]
    fn prune_drops_dangling_events_and_threads() {
        let mut state = sample();
        state.events.push(
            CalendarEvent::new("e3", "Old", "2024-01-02", EventKind::General).attached_to(99_u64),
        );
        state.chat_messages.insert(EntityId::from(99_u64), Vec::new());
        let report = state.prune_orphans();
        assert_eq!(report, PruneReport { events: 1, threads: 1 });
        assert!(state.check_integrity().is_empty());
        assert_eq!(state.events.len(), 2);
    }

    #[test]
    fn integrity_reports_every_problem() {
        let mut state = sample();
        state.opportunities.push(Opportunity::new(1_u64, "Acme", "Dup"));
        state.events.push(
            CalendarEvent::new("e1", "Again", "2024-01-02", EventKind::General).attached_to(5_u64),
        );
        state.chat_messages.insert(EntityId::from(7_u64), Vec::new());
        let issues = state.check_integrity();
        assert!(issues.contains(&IntegrityIssue::DuplicateOpportunity { id: EntityId::from(1_u64) }));
        assert!(issues.contains(&IntegrityIssue::DuplicateEvent { id: EntityId::new("e1") }));
        assert!(issues.contains(&IntegrityIssue::DanglingEvent {
            event: EntityId::new("e1"),
            opportunity: EntityId::from(5_u64),
        }));
        assert!(issues.contains(&IntegrityIssue::OrphanThread { opportunity: EntityId::from(7_u64) }));
        assert!(issues.contains(&IntegrityIssue::StaleIndex));
    }

    #[test]
    fn deserialized_state_needs_consistency_pass() {
        let json = r#"{
            "opportunities": [{"id": 1, "company": "Acme"}],
            "events": [{"id": "e1", "title": "x", "date": "2024-01-01", "type": "general", "opportunityId": 1}],
            "chatMessages": {"1": [], "2": []}
        }"#;
        let raw: AppState = serde_json::from_str(json).expect("parse state");
        assert!(raw.check_integrity().contains(&IntegrityIssue::StaleIndex));

        let state = raw.into_consistent();
        assert!(state.check_integrity().is_empty());
        assert_eq!(state.chat_messages.len(), 1);
        assert_eq!(state.events_for(&EntityId::from(1_u64)).len(), 1);
    }

    #[test]
    fn consistency_pass_keeps_first_of_repeated_ids() {
        let mut state = sample();
        state.opportunities.push(Opportunity::new(1_u64, "Acme", "Dup"));
        state
            .events
            .push(CalendarEvent::new("e2", "Gym again", "2024-01-03", EventKind::General));

        let state = state.into_consistent();
        assert_eq!(state.opportunities.len(), 1);
        assert_eq!(state.opportunities[0].position, "Engineer");
        assert_eq!(state.events.len(), 2);
        assert_eq!(state.event(&EntityId::new("e2")).map(|e| e.title.as_str()), Some("Gym"));
        assert!(state.check_integrity().is_empty());
    }

    #[test]
    fn equality_ignores_index() {
        let indexed = sample();
        let mut unindexed = indexed.clone();
        unindexed.index = EventIndex::default();
        assert_eq!(indexed, unindexed);
    }

    #[test]
    fn thread_is_empty_when_absent() {
        let state = sample();
        assert!(state.thread(&EntityId::from(1_u64)).is_empty());
        assert_eq!(state.message_count(), 0);
    }
}
