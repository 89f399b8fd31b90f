use jobtrail_core::action::Action;
use jobtrail_core::derive::derive_events_at;
use jobtrail_core::model::{CalendarEvent, identities_match};
use jobtrail_core::reducer::reduce;
use jobtrail_core::state::AppState;
use proptest::prelude::*;

use generators::*;

fn run(actions: Vec<Action>, now: chrono::DateTime<chrono::Utc>) -> AppState {
    actions
        .into_iter()
        .fold(AppState::default(), |state, action| reduce(&state, action, now))
}

fn derived_of<'a>(state: &'a AppState, id: &jobtrail_core::EntityId) -> Vec<&'a CalendarEvent> {
    let mut events: Vec<&CalendarEvent> = state
        .events
        .iter()
        .filter(|e| e.is_derived())
        .filter(|e| e.opportunity_id.as_ref().is_some_and(|owner| identities_match(owner, id)))
        .collect();
    events.sort_by(|a, b| a.id.cmp(&b.id));
    events
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn every_reachable_state_is_consistent(
        actions in prop::collection::vec(arb_action(), 0..40),
        now in arb_now(),
    ) {
        let mut state = AppState::default();
        for action in actions {
            state = reduce(&state, action, now);
            prop_assert_eq!(state.check_integrity(), Vec::new());
        }
    }

    #[test]
    fn derived_events_match_generator(
        actions in prop::collection::vec(arb_incremental_action(), 0..40),
        now in arb_now(),
    ) {
        let state = run(actions, now);
        for opportunity in &state.opportunities {
            let expected = derive_events_at(opportunity, now.date_naive());
            let actual: Vec<CalendarEvent> =
                derived_of(&state, &opportunity.id).into_iter().cloned().collect();
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn delete_removes_every_dependent(
        actions in prop::collection::vec(arb_action(), 0..30),
        victim in arb_id(),
        now in arb_now(),
    ) {
        let state = run(actions, now);
        let next = reduce(&state, Action::DeleteOpportunity(victim.clone()), now);

        prop_assert!(!next.contains_opportunity(&victim));
        let no_victim_events = next.events.iter().all(|e| {
            e.opportunity_id.as_ref().is_none_or(|owner| !identities_match(owner, &victim))
        });
        prop_assert!(no_victim_events);
        prop_assert!(next.thread(&victim).is_empty());

        // Everything unrelated to the victim survives.
        let unrelated = state.events.iter().filter(|e| {
            e.opportunity_id.as_ref().is_none_or(|owner| !identities_match(owner, &victim))
        });
        prop_assert_eq!(unrelated.count(), next.events.len());
    }

    #[test]
    fn unknown_action_is_identity(
        actions in prop::collection::vec(arb_action(), 0..20),
        now in arb_now(),
    ) {
        let state = run(actions, now);
        prop_assert_eq!(reduce(&state, Action::Unknown, now), state.clone());
        prop_assert_eq!(reduce(&state, Action::decode("{\"type\": 7}"), now), state);
    }

    #[test]
    fn reduce_is_deterministic(
        actions in prop::collection::vec(arb_action(), 0..20),
        now in arb_now(),
    ) {
        prop_assert_eq!(run(actions.clone(), now), run(actions, now));
    }

    #[test]
    fn snapshot_document_round_trips(
        actions in prop::collection::vec(arb_action(), 0..20),
        now in arb_now(),
    ) {
        let state = run(actions, now);
        let json = serde_json::to_string(&state).expect("serialize state");
        let back: AppState = serde_json::from_str(&json).expect("parse state");
        let back = back.into_consistent();
        prop_assert_eq!(&back, &state);
        prop_assert!(back.check_integrity().is_empty());
    }
}
