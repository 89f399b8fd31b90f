//! Pipeline status of an opportunity and the phase each status belongs to.
//!
//! Statuses serialize as their human label (`"First Interview"`). Parsing
//! is case-insensitive and also accepts kebab or snake case
//! (`first-interview`, `first_interview`).

use crate::error::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five groups the pipeline statuses fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    InitialContact,
    Application,
    Interview,
    Decision,
    FollowUp,
}

impl Phase {
    /// All phases in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::InitialContact,
        Self::Application,
        Self::Interview,
        Self::Decision,
        Self::FollowUp,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitialContact => "Initial Contact",
            Self::Application => "Application",
            Self::Interview => "Interview",
            Self::Decision => "Decision",
            Self::FollowUp => "Follow-up",
        }
    }

    /// Statuses belonging to this phase, in pipeline order.
    pub fn statuses(self) -> impl Iterator<Item = Status> {
        Status::ALL.into_iter().filter(move |s| s.phase() == self)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold(s);
        Self::ALL
            .into_iter()
            .find(|phase| fold(phase.as_str()) == wanted)
            .ok_or_else(|| ParseEnumError {
                expected: "phase",
                got: s.to_string(),
            })
    }
}

/// Where an opportunity currently sits in the hiring pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Status {
    #[default]
    Bookmarked,
    Interested,
    Networking,
    RecruiterContact,
    Referral,
    PreparingApplication,
    Applied,
    ApplicationViewed,
    UnderReview,
    PhoneScreen,
    TechnicalAssessment,
    FirstInterview,
    SecondInterview,
    FinalInterview,
    OnsiteInterview,
    ReferenceCheck,
    OfferReceived,
    Negotiating,
    OfferAccepted,
    OfferDeclined,
    Rejected,
    Withdrawn,
    PositionClosed,
    FollowingUp,
    ThankYouSent,
    AwaitingResponse,
}

impl Status {
    /// All statuses in pipeline order.
    pub const ALL: [Self; 26] = [
        Self::Bookmarked,
        Self::Interested,
        Self::Networking,
        Self::RecruiterContact,
        Self::Referral,
        Self::PreparingApplication,
        Self::Applied,
        Self::ApplicationViewed,
        Self::UnderReview,
        Self::PhoneScreen,
        Self::TechnicalAssessment,
        Self::FirstInterview,
        Self::SecondInterview,
        Self::FinalInterview,
        Self::OnsiteInterview,
        Self::ReferenceCheck,
        Self::OfferReceived,
        Self::Negotiating,
        Self::OfferAccepted,
        Self::OfferDeclined,
        Self::Rejected,
        Self::Withdrawn,
        Self::PositionClosed,
        Self::FollowingUp,
        Self::ThankYouSent,
        Self::AwaitingResponse,
    ];

    /// Human label, also the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bookmarked => "Bookmarked",
            Self::Interested => "Interested",
            Self::Networking => "Networking",
            Self::RecruiterContact => "Recruiter Contact",
            Self::Referral => "Referral",
            Self::PreparingApplication => "Preparing Application",
            Self::Applied => "Applied",
            Self::ApplicationViewed => "Application Viewed",
            Self::UnderReview => "Under Review",
            Self::PhoneScreen => "Phone Screen",
            Self::TechnicalAssessment => "Technical Assessment",
            Self::FirstInterview => "First Interview",
            Self::SecondInterview => "Second Interview",
            Self::FinalInterview => "Final Interview",
            Self::OnsiteInterview => "Onsite Interview",
            Self::ReferenceCheck => "Reference Check",
            Self::OfferReceived => "Offer Received",
            Self::Negotiating => "Negotiating",
            Self::OfferAccepted => "Offer Accepted",
            Self::OfferDeclined => "Offer Declined",
            Self::Rejected => "Rejected",
            Self::Withdrawn => "Withdrawn",
            Self::PositionClosed => "Position Closed",
            Self::FollowingUp => "Following Up",
            Self::ThankYouSent => "Thank You Sent",
            Self::AwaitingResponse => "Awaiting Response",
        }
    }

    /// Lowercase kebab-case form, used in derived event ids.
    #[must_use]
    pub fn slug(self) -> String {
        self.as_str().to_ascii_lowercase().replace(' ', "-")
    }

    #[must_use]
    pub const fn phase(self) -> Phase {
        match self {
            Self::Bookmarked
            | Self::Interested
            | Self::Networking
            | Self::RecruiterContact
            | Self::Referral => Phase::InitialContact,
            Self::PreparingApplication
            | Self::Applied
            | Self::ApplicationViewed
            | Self::UnderReview => Phase::Application,
            Self::PhoneScreen
            | Self::TechnicalAssessment
            | Self::FirstInterview
            | Self::SecondInterview
            | Self::FinalInterview
            | Self::OnsiteInterview
            | Self::ReferenceCheck => Phase::Interview,
            Self::OfferReceived
            | Self::Negotiating
            | Self::OfferAccepted
            | Self::OfferDeclined
            | Self::Rejected
            | Self::Withdrawn
            | Self::PositionClosed => Phase::Decision,
            Self::FollowingUp | Self::ThankYouSent | Self::AwaitingResponse => Phase::FollowUp,
        }
    }

    /// Whether the opportunity has reached an end state.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(
            self,
            Self::OfferAccepted
                | Self::OfferDeclined
                | Self::Rejected
                | Self::Withdrawn
                | Self::PositionClosed
        )
    }
}

/// Lowercase and drop separators so `First Interview`, `first-interview`
/// and `FIRST_INTERVIEW` compare equal.
fn fold(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold(s);
        Self::ALL
            .into_iter()
            .find(|status| fold(status.as_str()) == wanted)
            .ok_or_else(|| ParseEnumError {
                expected: "status",
                got: s.to_string(),
            })
    }
}

// Custom serde: serialize as the human label.
impl Serialize for Status {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
