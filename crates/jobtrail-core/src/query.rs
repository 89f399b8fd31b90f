//! Read-side views over the state tree.
//!
//! Nothing here is stored. Each view is computed from the current tree
//! on request.

use crate::dates;
use crate::model::{CalendarEvent, EntityId, Opportunity, Phase, Status};
use crate::state::AppState;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Conjunctive filter over opportunities. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpportunityFilter {
    pub status: Option<Status>,
    pub phase: Option<Phase>,
    pub tag: Option<String>,
    /// Case-insensitive substring of company, position, notes or location.
    pub text: Option<String>,
}

impl OpportunityFilter {
    #[must_use]
    pub fn matches(&self, opportunity: &Opportunity) -> bool {
        if let Some(status) = self.status
            && opportunity.status != status
        {
            return false;
        }
        if let Some(phase) = self.phase
            && opportunity.status.phase() != phase
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !opportunity.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
        {
            return false;
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let haystacks = [
                Some(opportunity.company.as_str()),
                Some(opportunity.position.as_str()),
                opportunity.notes.as_deref(),
                opportunity.location.as_deref(),
            ];
            if !haystacks
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }

    /// Opportunities in `state` passing the filter, in collection order.
    #[must_use]
    pub fn apply<'a>(&self, state: &'a AppState) -> Vec<&'a Opportunity> {
        state
            .opportunities
            .iter()
            .filter(|opp| self.matches(opp))
            .collect()
    }
}

/// Events referencing `opportunity`.
#[must_use]
pub fn events_for<'a>(state: &'a AppState, opportunity: &EntityId) -> Vec<&'a CalendarEvent> {
    state.events_for(opportunity)
}

/// Events dated within `[from, from + days]`, ordered by date, then time,
/// then title. Events whose date does not parse are skipped.
#[must_use]
pub fn upcoming_events(state: &AppState, from: NaiveDate, days: u64) -> Vec<&CalendarEvent> {
    let until = from.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);

    let mut window: Vec<(NaiveDate, &CalendarEvent)> = state
        .events
        .iter()
        .filter_map(|event| dates::parse_date(&event.date).map(|date| (date, event)))
        .filter(|(date, _)| *date >= from && *date <= until)
        .collect();

    window.sort_by(|(a_date, a), (b_date, b)| {
        a_date
            .cmp(b_date)
            .then_with(|| a.time.cmp(&b.time))
            .then_with(|| a.title.cmp(&b.title))
    });
    window.into_iter().map(|(_, event)| event).collect()
}

/// Counts of the pipeline at a glance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub total: usize,
    /// Open opportunities (not in a closed status).
    pub active: usize,
    pub by_phase: BTreeMap<Phase, usize>,
    pub by_status: BTreeMap<Status, usize>,
    pub events: usize,
    pub derived_events: usize,
    pub chat_messages: usize,
}

impl PipelineSummary {
    #[must_use]
    pub fn of(state: &AppState) -> Self {
        let mut summary = Self {
            total: state.opportunities.len(),
            events: state.events.len(),
            derived_events: state.events.iter().filter(|e| e.is_derived()).count(),
            chat_messages: state.message_count(),
            ..Self::default()
        };
        for phase in Phase::ALL {
            summary.by_phase.insert(phase, 0);
        }
        for opportunity in &state.opportunities {
            *summary.by_phase.entry(opportunity.status.phase()).or_default() += 1;
            *summary.by_status.entry(opportunity.status).or_default() += 1;
            if !opportunity.status.is_closed() {
                summary.active += 1;
            }
        }
        summary
    }
}
