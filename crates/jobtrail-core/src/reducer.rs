//! The synchronization reducer.
//!
//! [`reduce`] is a total, pure transition: it takes the current tree and
//! one action and returns the next tree. It never performs I/O and never
//! fails. Actions that cannot apply (unknown tags, missing targets) leave
//! the tree unchanged and log why.
//!
//! Invariants held after every transition:
//!
//! - every event back-reference names an existing opportunity;
//! - every chat thread is keyed by an existing opportunity;
//! - the derived events of an opportunity are exactly what
//!   [`derive_events_at`] produces for its current fields;
//! - the event index matches the event list.

use crate::action::{Action, LoadData};
use crate::derive::derive_events_at;
use crate::model::{
    CalendarEvent, ChatMessage, EntityId, EventOrigin, EventPatch, Opportunity, OpportunityPatch,
    ProfilePatch, Sender, identities_match,
};
use crate::state::{AppState, references};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Apply `action` to `state`, producing the next state.
///
/// `now` is the only source of time: it stamps chat messages, seeds
/// fresh ids, and stands in for unparseable reference dates.
#[must_use]
pub fn reduce(state: &AppState, action: Action, now: DateTime<Utc>) -> AppState {
    let mut next = state.clone();
    debug!(action = action.tag(), "reducing");

    match action {
        Action::AddOpportunity(opportunity) => add_opportunity(&mut next, opportunity, now),
        Action::UpdateOpportunity { id, patch } => update_opportunity(&mut next, &id, &patch, now),
        Action::DeleteOpportunity(id) => delete_opportunity(&mut next, &id),
        Action::SetOpportunities(opportunities) => {
            next.opportunities = opportunities;
            settle_bulk(&mut next, "SET_OPPORTUNITIES");
        }
        Action::AddEvent(event) => add_event(&mut next, event, now),
        Action::UpdateEvent { id, patch } => update_event(&mut next, &id, patch),
        Action::DeleteEvent(id) => delete_event(&mut next, &id),
        Action::SetEvents(events) => {
            next.events = events;
            settle_bulk(&mut next, "SET_EVENTS");
        }
        Action::AddChatMessage {
            opportunity_id,
            text,
            sender,
        } => add_chat_message(&mut next, &opportunity_id, text, sender, now),
        Action::UpdateUserProfile(patch) => update_profile(&mut next, &patch),
        Action::SetMasterResume(resume) => next.master_resume = resume,
        Action::LoadData(data) => load_data(&mut next, data),
        Action::Unknown => debug!("unknown action left state unchanged"),
    }

    next
}

fn add_opportunity(state: &mut AppState, mut opportunity: Opportunity, now: DateTime<Utc>) {
    if opportunity.id.is_blank() || state.contains_opportunity(&opportunity.id) {
        let fresh = EntityId::fresh(now.timestamp_millis(), |candidate| {
            state.contains_opportunity(candidate)
        });
        debug!(requested = %opportunity.id, assigned = %fresh, "opportunity id collided, issuing fresh id");
        opportunity.id = fresh;
    }

    let derived = derive_events_at(&opportunity, now.date_naive());
    state.opportunities.push(opportunity);
    make_room_for_derived(state, &derived, now);
    state.events.extend(derived);
    state.reindex();
}

fn update_opportunity(
    state: &mut AppState,
    id: &EntityId,
    patch: &OpportunityPatch,
    now: DateTime<Utc>,
) {
    let Some(current) = state.opportunity(id).map(|opp| opp.id.clone()) else {
        warn!(%id, "update for unknown opportunity ignored");
        return;
    };

    let renamed = match &patch.id {
        Some(new_id) if !new_id.is_blank() && !identities_match(new_id, &current) => {
            if state.contains_opportunity(new_id) {
                warn!(%current, %new_id, "id fold-back would collide, keeping local id");
                None
            } else {
                rename_opportunity(state, &current, new_id);
                Some(new_id.clone())
            }
        }
        _ => None,
    };
    let target = renamed.clone().unwrap_or(current);

    let Some(opportunity) = state.opportunity_mut(&target) else {
        return;
    };
    let inputs_changed = opportunity.apply(patch);

    // Setting a status always rebuilds, even when it is the current one.
    if inputs_changed || patch.status.is_some() || renamed.is_some() {
        regenerate_derived(state, &target, now);
    }
}

/// Re-key an opportunity and everything that refers to it.
fn rename_opportunity(state: &mut AppState, from: &EntityId, to: &EntityId) {
    if let Some(opportunity) = state.opportunity_mut(from) {
        opportunity.id = to.clone();
    }

    for event in &mut state.events {
        if references(event, from) {
            event.opportunity_id = Some(to.clone());
        }
    }

    if let Some(mut thread) = state.chat_messages.remove(from) {
        let merged = state.chat_messages.entry(to.clone()).or_default();
        thread.append(merged);
        *merged = thread;
    }

    debug!(%from, %to, "opportunity re-keyed");
    state.reindex();
}

/// Replace the derived events of one opportunity with a fresh derivation.
/// User-authored events attached to it are left alone.
fn regenerate_derived(state: &mut AppState, opportunity_id: &EntityId, now: DateTime<Utc>) {
    let Some(opportunity) = state.opportunity(opportunity_id) else {
        return;
    };
    let derived = derive_events_at(opportunity, now.date_naive());

    let before = state.events.len();
    state
        .events
        .retain(|event| !(event.is_derived() && references(event, opportunity_id)));
    let removed = before - state.events.len();

    debug!(
        opportunity = %opportunity_id,
        removed,
        added = derived.len(),
        "regenerated derived events"
    );
    make_room_for_derived(state, &derived, now);
    state.events.extend(derived);
    state.reindex();
}

/// Move any event already holding one of the `derived` ids to a fresh id,
/// so derived ids stay exactly what the generator produces.
fn make_room_for_derived(state: &mut AppState, derived: &[CalendarEvent], now: DateTime<Utc>) {
    for incoming in derived {
        let Some(position) = state
            .events
            .iter()
            .position(|event| identities_match(&event.id, &incoming.id))
        else {
            continue;
        };
        let fresh = EntityId::fresh(now.timestamp_millis(), |candidate| {
            state.events.iter().any(|event| identities_match(&event.id, candidate))
                || derived.iter().any(|event| identities_match(&event.id, candidate))
        });
        warn!(
            requested = %incoming.id,
            assigned = %fresh,
            "event held a derived id, moving it to a fresh id"
        );
        state.events[position].id = fresh;
    }
}

fn delete_opportunity(state: &mut AppState, id: &EntityId) {
    let Some(position) = state
        .opportunities
        .iter()
        .position(|opp| identities_match(&opp.id, id))
    else {
        warn!(%id, "delete for unknown opportunity ignored");
        return;
    };

    let removed = state.opportunities.remove(position);
    let owned = state
        .index()
        .events_for(&removed.id)
        .cloned()
        .unwrap_or_default();

    let before = state.events.len();
    state
        .events
        .retain(|event| !(owned.contains(&event.id) && references(event, &removed.id)));
    let thread = state.chat_messages.remove(&removed.id);

    debug!(
        id = %removed.id,
        events = before - state.events.len(),
        messages = thread.as_ref().map_or(0, Vec::len),
        "opportunity deleted with dependents"
    );
    state.reindex();
}

fn add_event(state: &mut AppState, mut event: CalendarEvent, now: DateTime<Utc>) {
    if event.id.is_blank() || state.contains_event(&event.id) {
        let fresh = EntityId::fresh(now.timestamp_millis(), |candidate| {
            state.contains_event(candidate)
        });
        debug!(requested = %event.id, assigned = %fresh, "event id collided, issuing fresh id");
        event.id = fresh;
    }
    if event.is_derived() {
        debug!(event = %event.id, "added event marked derived, storing as user event");
    }
    event.origin = EventOrigin::User;

    if let Some(owner) = &event.opportunity_id {
        if let Some(opportunity) = state.opportunity(owner) {
            event.opportunity_id = Some(opportunity.id.clone());
        } else {
            warn!(event = %event.id, %owner, "event references unknown opportunity, detaching");
            event.opportunity_id = None;
        }
    }

    state.events.push(event);
    state.reindex();
}

fn update_event(state: &mut AppState, id: &EntityId, mut patch: EventPatch) {
    if let Some(owner) = &patch.opportunity_id
        && !owner.is_blank()
        && !state.contains_opportunity(owner)
    {
        warn!(%id, %owner, "event patch references unknown opportunity, keeping current owner");
        patch.opportunity_id = None;
    }

    let Some(event) = state
        .events
        .iter_mut()
        .find(|event| identities_match(&event.id, id))
    else {
        warn!(%id, "update for unknown event ignored");
        return;
    };

    event.apply(&patch);
    state.reindex();
}

fn delete_event(state: &mut AppState, id: &EntityId) {
    let before = state.events.len();
    state.events.retain(|event| !identities_match(&event.id, id));
    if state.events.len() == before {
        warn!(%id, "delete for unknown event ignored");
        return;
    }
    state.reindex();
}

fn add_chat_message(
    state: &mut AppState,
    opportunity_id: &EntityId,
    text: String,
    sender: Sender,
    now: DateTime<Utc>,
) {
    if text.trim().is_empty() {
        debug!(opportunity = %opportunity_id, "empty chat message ignored");
        return;
    }

    let Some(owner) = state.opportunity(opportunity_id).map(|opp| opp.id.clone()) else {
        warn!(opportunity = %opportunity_id, "chat message for unknown opportunity ignored");
        return;
    };

    let thread = state.chat_messages.entry(owner).or_default();
    let id = EntityId::new(format!("{}-{}", now.timestamp_millis(), thread.len()));
    thread.push(ChatMessage {
        id,
        sender,
        text,
        timestamp: now,
    });
}

fn update_profile(state: &mut AppState, patch: &ProfilePatch) {
    state.user_profile.apply(patch);
}

fn load_data(state: &mut AppState, data: LoadData) {
    let LoadData {
        opportunities,
        events,
        master_resume,
        user_profile,
        chat_messages,
    } = data;

    if let Some(opportunities) = opportunities {
        state.opportunities = opportunities;
    }
    if let Some(events) = events {
        state.events = events;
    }
    if let Some(resume) = master_resume {
        state.master_resume = resume;
    }
    if let Some(profile) = user_profile {
        state.user_profile = profile;
    }
    if let Some(threads) = chat_messages {
        state.chat_messages = threads;
    }

    settle_bulk(state, "LOAD_DATA");
}

/// After a wholesale replacement, drop repeated ids and anything left
/// without an owner.
fn settle_bulk(state: &mut AppState, tag: &str) {
    let duplicates = state.dedupe_ids();
    if duplicates > 0 {
        warn!(action = tag, duplicates, "dropped records with repeated ids");
    }

    let report = state.prune_orphans();
    if !report.is_empty() {
        warn!(
            action = tag,
            events = report.events,
            threads = report.threads,
            "pruned records without an owning opportunity"
        );
    }
}
