//! Derived calendar reminders.
//!
//! A status maps to at most one reminder template, offset from the
//! opportunity's reference date:
//!
//! | Status                               | Offset | Type       |
//! |--------------------------------------|--------|------------|
//! | Technical Assessment                 | +3d    | assessment |
//! | First / Second / Final Interview     | +5d    | interview  |
//! | Applied / Following Up               | +7d    | followup   |
//! | Offer Received                       | +7d    | deadline   |
//!
//! Every other status produces nothing. The functions here are pure: they
//! never look at existing events. Replacing stale reminders is the
//! reducer's job.

use crate::dates;
use crate::model::{CalendarEvent, EntityId, EventKind, EventOrigin, Opportunity, Status};
use chrono::{Days, NaiveDate, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Template {
    offset_days: u64,
    kind: EventKind,
}

const fn template_for(status: Status) -> Option<Template> {
    let (offset_days, kind) = match status {
        Status::TechnicalAssessment => (3, EventKind::Assessment),
        Status::FirstInterview | Status::SecondInterview | Status::FinalInterview => {
            (5, EventKind::Interview)
        }
        Status::Applied | Status::FollowingUp => (7, EventKind::Followup),
        Status::OfferReceived => (7, EventKind::Deadline),
        _ => return None,
    };
    Some(Template { offset_days, kind })
}

fn title_for(status: Status, company: &str) -> String {
    match status {
        Status::TechnicalAssessment => format!("Technical Assessment for {company}"),
        Status::OfferReceived => format!("Deadline to respond to {company} offer"),
        Status::Applied | Status::FollowingUp => format!("Follow up with {company}"),
        other => format!("{other} with {company}"),
    }
}

/// Whether `status` produces any derived reminder.
#[must_use]
pub const fn status_has_reminder(status: Status) -> bool {
    template_for(status).is_some()
}

/// Deterministic id of the reminder derived for `opportunity` in `status`.
#[must_use]
pub fn derived_event_id(opportunity: &EntityId, status: Status, kind: EventKind) -> EntityId {
    EntityId::new(format!("{opportunity}:{kind}-{}", status.slug()))
}

/// Derive reminders for an opportunity, using today's date when the
/// reference date does not parse.
#[must_use]
pub fn derive_events(opportunity: &Opportunity) -> Vec<CalendarEvent> {
    derive_events_at(opportunity, Utc::now().date_naive())
}

/// Derive reminders for an opportunity with an explicit fallback date.
#[must_use]
pub fn derive_events_at(opportunity: &Opportunity, today: NaiveDate) -> Vec<CalendarEvent> {
    let Some(template) = template_for(opportunity.status) else {
        return Vec::new();
    };

    let anchor = opportunity.reference_date_or(today);
    let date = anchor
        .checked_add_days(Days::new(template.offset_days))
        .unwrap_or(anchor);

    let description = match (opportunity.position.trim(), opportunity.company.trim()) {
        ("", _) => None,
        (position, "") => Some(position.to_string()),
        (position, company) => Some(format!("{position} at {company}")),
    };

    vec![CalendarEvent {
        id: derived_event_id(&opportunity.id, opportunity.status, template.kind),
        title: title_for(opportunity.status, &opportunity.company),
        date: dates::format_date(date),
        time: None,
        end: None,
        kind: template.kind,
        opportunity_id: Some(opportunity.id.clone()),
        description,
        location: opportunity.location.clone(),
        origin: EventOrigin::Derived,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opp(status: Status) -> Opportunity {
        Opportunity::new(1_u64, "Acme", "Platform Engineer")
            .with_status(status)
            .with_reference_date("2024-01-01")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).expect("date")
    }

    #[test]
    fn applied_yields_followup_a_week_later() {
        let events = derive_events_at(&opp(Status::Applied), today());
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.kind, EventKind::Followup);
        assert_eq!(event.date, "2024-01-08");
        assert_eq!(event.title, "Follow up with Acme");
        assert_eq!(event.origin, EventOrigin::Derived);
        assert_eq!(event.opportunity_id, Some(EntityId::from(1_u64)));
    }

    #[test]
    fn interviews_use_status_in_title() {
        for (status, title) in [
            (Status::FirstInterview, "First Interview with Acme"),
            (Status::SecondInterview, "Second Interview with Acme"),
            (Status::FinalInterview, "Final Interview with Acme"),
        ] {
            let events = derive_events_at(&opp(status), today());
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].title, title);
            assert_eq!(events[0].date, "2024-01-06");
            assert_eq!(events[0].kind, EventKind::Interview);
        }
    }

    #[test]
    fn assessment_and_offer_templates() {
        let assessment = derive_events_at(&opp(Status::TechnicalAssessment), today());
        assert_eq!(assessment[0].date, "2024-01-04");
        assert_eq!(assessment[0].title, "Technical Assessment for Acme");
        assert_eq!(assessment[0].kind, EventKind::Assessment);

        let offer = derive_events_at(&opp(Status::OfferReceived), today());
        assert_eq!(offer[0].date, "2024-01-08");
        assert_eq!(offer[0].title, "Deadline to respond to Acme offer");
        assert_eq!(offer[0].kind, EventKind::Deadline);

        let following_up = derive_events_at(&opp(Status::FollowingUp), today());
        assert_eq!(following_up[0].title, "Follow up with Acme");
    }

    #[test]
    fn other_statuses_produce_nothing() {
        let with_reminder = [
            Status::TechnicalAssessment,
            Status::FirstInterview,
            Status::SecondInterview,
            Status::FinalInterview,
            Status::Applied,
            Status::FollowingUp,
            Status::OfferReceived,
        ];
        for status in Status::ALL {
            let expected = usize::from(with_reminder.contains(&status));
            assert_eq!(derive_events_at(&opp(status), today()).len(), expected, "{status}");
            assert_eq!(status_has_reminder(status), expected == 1);
        }
    }

    #[test]
    fn unparseable_reference_date_uses_today() {
        let o = opp(Status::Applied).with_reference_date("someday");
        let events = derive_events_at(&o, today());
        assert_eq!(events[0].date, "2030-01-08");
    }

    #[test]
    fn derivation_is_deterministic() {
        let o = opp(Status::FirstInterview);
        assert_eq!(derive_events_at(&o, today()), derive_events_at(&o, today()));
        assert_eq!(derive_events_at(&o, today())[0].id.as_str(), "1:interview-first-interview");
    }

    #[test]
    fn description_and_location_follow_opportunity() {
        let mut o = opp(Status::Applied);
        o.location = Some("Berlin".into());
        let event = &derive_events_at(&o, today())[0];
        assert_eq!(event.description.as_deref(), Some("Platform Engineer at Acme"));
        assert_eq!(event.location.as_deref(), Some("Berlin"));
    }
}
