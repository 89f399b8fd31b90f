use super::id::EntityId;
use crate::error::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The fixed set of calendar event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Interview,
    Deadline,
    Followup,
    Assessment,
    #[default]
    General,
}

impl EventKind {
    pub const ALL: [Self; 5] = [
        Self::Interview,
        Self::Deadline,
        Self::Followup,
        Self::Assessment,
        Self::General,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interview => "interview",
            Self::Deadline => "deadline",
            Self::Followup => "followup",
            Self::Assessment => "assessment",
            Self::General => "general",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interview" => Ok(Self::Interview),
            "deadline" => Ok(Self::Deadline),
            "followup" | "follow-up" => Ok(Self::Followup),
            "assessment" => Ok(Self::Assessment),
            "general" => Ok(Self::General),
            _ => Err(ParseEnumError {
                expected: "event type",
                got: s.to_string(),
            }),
        }
    }
}

/// How an event came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOrigin {
    /// Created directly by the user.
    #[default]
    User,
    /// Produced from an opportunity's status; replaced on regeneration.
    Derived,
}

/// A dated calendar entry, optionally attached to an opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: EntityId,
    pub title: String,
    /// `YYYY-MM-DD`, or any timestamp the date parser accepts.
    pub date: String,
    /// Optional `HH:MM` start time. Without it the event is all-day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Optional explicit end timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Back-reference to the owning opportunity.
    #[serde(skip_serializing_if = "Option::is_none", alias = "applicationId")]
    pub opportunity_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub origin: EventOrigin,
}

impl CalendarEvent {
    /// A user-authored event with no back-reference.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, title: &str, date: &str, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            date: date.to_string(),
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attached_to(mut self, opportunity: impl Into<EntityId>) -> Self {
        self.opportunity_id = Some(opportunity.into());
        self
    }

    #[must_use]
    pub const fn is_derived(&self) -> bool {
        matches!(self.origin, EventOrigin::Derived)
    }

    /// Merge a patch. The origin of an event never changes.
    pub fn apply(&mut self, patch: &EventPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(date) = &patch.date {
            self.date.clone_from(date);
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(opportunity) = &patch.opportunity_id {
            self.opportunity_id = (!opportunity.is_blank()).then(|| opportunity.clone());
        }
        set_optional(&mut self.time, patch.time.as_deref());
        set_optional(&mut self.end, patch.end.as_deref());
        set_optional(&mut self.description, patch.description.as_deref());
        set_optional(&mut self.location, patch.location.as_deref());
    }
}

fn set_optional(slot: &mut Option<String>, value: Option<&str>) {
    match value {
        Some("") => *slot = None,
        Some(v) => *slot = Some(v.to_string()),
        None => {}
    }
}

/// Partial update for a [`CalendarEvent`].
///
/// An empty string clears an optional text field and a blank
/// `opportunityId` detaches the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "type")]
    pub kind: Option<EventKind>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "applicationId")]
    pub opportunity_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}
