//! End-to-end walk through the pipeline of a single opportunity, plus the
//! persistence round trip a host shell performs around it.

use chrono::{DateTime, TimeZone, Utc};
use jobtrail_core::derive::derive_events;
use jobtrail_core::ics::{ExportOptions, to_calendar_feed, to_calendar_text, to_calendar_text_at};
use jobtrail_core::model::{EventKind, OpportunityPatch, identities_match};
use jobtrail_core::{
    Action, AppState, CalendarEvent, EntityId, FixedClock, Opportunity, Sender, SnapshotStore,
    Status, Store, reduce,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0)
        .single()
        .expect("valid time")
}

fn acme() -> Opportunity {
    Opportunity::new(1_u64, "Acme", "Engineer")
        .with_status(Status::Applied)
        .with_reference_date("2024-01-01")
}

#[test]
fn applied_then_interview_then_delete() {
    let state = reduce(&AppState::default(), Action::AddOpportunity(acme()), now());
    assert_eq!(state.events.len(), 1);
    let followup = &state.events[0];
    assert_eq!(followup.kind, EventKind::Followup);
    assert_eq!(followup.date, "2024-01-08");
    assert_eq!(followup.title, "Follow up with Acme");

    let state = reduce(
        &state,
        Action::AddChatMessage {
            opportunity_id: EntityId::new("1"),
            text: "What should I ask in the interview?".into(),
            sender: Sender::User,
        },
        now(),
    );

    let state = reduce(
        &state,
        Action::UpdateOpportunity {
            id: EntityId::from(1_u64),
            patch: OpportunityPatch::status(Status::FirstInterview),
        },
        now(),
    );
    assert_eq!(state.events.len(), 1);
    let interview = &state.events[0];
    assert_eq!(interview.kind, EventKind::Interview);
    assert_eq!(interview.date, "2024-01-06");
    assert!(state.events.iter().all(|e| e.kind != EventKind::Followup));
    assert_eq!(state.thread(&EntityId::new("1")).len(), 1);

    let state = reduce(&state, Action::DeleteOpportunity(EntityId::new("1")), now());
    assert!(state.opportunities.is_empty());
    assert!(state.events.is_empty());
    assert!(state.chat_messages.is_empty());
}

#[test]
fn numeric_and_string_ids_are_the_same_identity() {
    assert!(identities_match(&1_u64, "1"));
    assert!(identities_match(&EntityId::new("x"), &EntityId::new("x")));
    assert!(!identities_match(&1_u64, "2"));
}

#[test]
fn deleting_missing_ids_changes_nothing() {
    let state = reduce(&AppState::default(), Action::AddOpportunity(acme()), now());
    for action in [
        Action::DeleteOpportunity(EntityId::new("999")),
        Action::DeleteEvent(EntityId::new("999")),
    ] {
        let next = reduce(&state, action, now());
        assert_eq!(next.opportunities.len(), state.opportunities.len());
        assert_eq!(next.events.len(), state.events.len());
    }
}

#[test]
fn user_events_survive_status_changes_but_not_deletion() {
    let state = [
        Action::AddOpportunity(acme()),
        Action::AddEvent(
            CalendarEvent::new("prep", "Prep with mentor", "2024-01-04", EventKind::General)
                .attached_to("1"),
        ),
        Action::UpdateOpportunity {
            id: EntityId::new("1"),
            patch: OpportunityPatch::status(Status::OfferReceived),
        },
    ]
    .into_iter()
    .fold(AppState::default(), |acc, action| reduce(&acc, action, now()));

    let titles: Vec<&str> = state.events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Prep with mentor", "Deadline to respond to Acme offer"]);

    let state = reduce(&state, Action::DeleteOpportunity(EntityId::from(1_u64)), now());
    assert!(state.events.is_empty());
}

#[test]
fn exported_fields_are_stable_across_runs() {
    let state = reduce(&AppState::default(), Action::AddOpportunity(acme()), now());
    let event = &state.events[0];
    let options = ExportOptions::default();

    let stable = |text: &str| -> Vec<String> {
        text.split("\r\n")
            .filter(|line| {
                ["SUMMARY", "DTSTART", "DTEND", "LOCATION"]
                    .iter()
                    .any(|key| line.starts_with(key))
            })
            .map(str::to_string)
            .collect()
    };

    let first = to_calendar_text_at(event, now(), &options);
    let later = to_calendar_text_at(event, now() + chrono::Duration::hours(3), &options);
    assert_eq!(stable(&first), stable(&later));
    assert!(first.contains("SUMMARY:Follow up with Acme\r\n"));
    assert!(first.contains("DTSTART:20240108T000000Z\r\n"));
    assert!(first.contains("DTEND:20240108T010000Z\r\n"));
}

#[test]
fn wall_clock_entry_points_agree_with_pinned_ones() {
    let events = derive_events(&acme());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].date, "2024-01-08");

    let single = to_calendar_text(&events[0]);
    assert!(single.contains("DTSTART:20240108T000000Z\r\n"));
    assert!(single.contains("TRIGGER:-PT30M\r\n"));

    let second = CalendarEvent::new("call", "Recruiter call", "2024-01-02", EventKind::General);
    let feed = to_calendar_feed(&[events[0].clone(), second], &ExportOptions::default());
    assert_eq!(feed.matches("BEGIN:VEVENT").count(), 2);
    assert!(feed.contains("SUMMARY:Recruiter call\r\n"));
}

#[test]
fn store_persists_across_sessions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let snapshots = SnapshotStore::new(dir.path(), "jobtrail-state.json");

    {
        let mut store = Store::open_with_clock(snapshots.clone(), FixedClock(now())).expect("open");
        store.dispatch(Action::AddOpportunity(acme()));
        store.dispatch_json(
            r#"{"type": "ADD_CHAT_MESSAGE", "payload": {"applicationId": 1, "content": "hi", "sender": "user"}}"#,
        );
        store.save().expect("save");
    }

    let store = Store::open_with_clock(snapshots, FixedClock(now())).expect("reopen");
    let state = store.state();
    assert_eq!(state.opportunities.len(), 1);
    assert_eq!(state.events_for(&EntityId::from(1_u64)).len(), 1);
    assert_eq!(state.message_count(), 1);
    assert!(state.check_integrity().is_empty());
}
