//! The action schema: the reducer's only input surface.
//!
//! On the wire an action is `{"type": "ADD_OPPORTUNITY", "payload": ...}`.
//! [`Action::parse`] is strict and reports why a document was rejected;
//! [`Action::decode`] is what the store uses and turns every rejection
//! into [`Action::Unknown`], which the reducer treats as a no-op.

use crate::error::ErrorCode;
use crate::model::{
    CalendarEvent, ChatThreads, EntityId, EventPatch, Opportunity, OpportunityPatch, ProfilePatch,
    Sender, UserProfile,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One state transition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddOpportunity(Opportunity),
    UpdateOpportunity {
        id: EntityId,
        #[serde(alias = "updates")]
        patch: OpportunityPatch,
    },
    DeleteOpportunity(EntityId),
    SetOpportunities(Vec<Opportunity>),
    AddEvent(CalendarEvent),
    UpdateEvent {
        id: EntityId,
        #[serde(alias = "updates")]
        patch: EventPatch,
    },
    DeleteEvent(EntityId),
    SetEvents(Vec<CalendarEvent>),
    #[serde(rename_all = "camelCase")]
    AddChatMessage {
        #[serde(alias = "applicationId")]
        opportunity_id: EntityId,
        #[serde(alias = "message", alias = "content")]
        text: String,
        sender: Sender,
    },
    UpdateUserProfile(ProfilePatch),
    SetMasterResume(String),
    LoadData(LoadData),
    /// Anything unrecognized or malformed. Never serialized.
    #[serde(skip)]
    Unknown,
}

/// Bulk hydrate payload from the remote store. Absent collections keep
/// their current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opportunities: Option<Vec<Opportunity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<CalendarEvent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_resume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_messages: Option<ChatThreads>,
}

/// Why an action document was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("action is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    #[error("action has no string \"type\" field")]
    MissingType,

    #[error("unknown action type '{0}'")]
    UnknownType(String),

    #[error("malformed {tag} payload: {source}")]
    Malformed {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ActionError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::MalformedAction
    }
}

impl Action {
    /// Every recognized wire tag.
    pub const TAGS: [&'static str; 12] = [
        "ADD_OPPORTUNITY",
        "UPDATE_OPPORTUNITY",
        "DELETE_OPPORTUNITY",
        "SET_OPPORTUNITIES",
        "ADD_EVENT",
        "UPDATE_EVENT",
        "DELETE_EVENT",
        "SET_EVENTS",
        "ADD_CHAT_MESSAGE",
        "UPDATE_USER_PROFILE",
        "SET_MASTER_RESUME",
        "LOAD_DATA",
    ];

    /// The wire tag of this action.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::AddOpportunity(_) => "ADD_OPPORTUNITY",
            Self::UpdateOpportunity { .. } => "UPDATE_OPPORTUNITY",
            Self::DeleteOpportunity(_) => "DELETE_OPPORTUNITY",
            Self::SetOpportunities(_) => "SET_OPPORTUNITIES",
            Self::AddEvent(_) => "ADD_EVENT",
            Self::UpdateEvent { .. } => "UPDATE_EVENT",
            Self::DeleteEvent(_) => "DELETE_EVENT",
            Self::SetEvents(_) => "SET_EVENTS",
            Self::AddChatMessage { .. } => "ADD_CHAT_MESSAGE",
            Self::UpdateUserProfile(_) => "UPDATE_USER_PROFILE",
            Self::SetMasterResume(_) => "SET_MASTER_RESUME",
            Self::LoadData(_) => "LOAD_DATA",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Strictly parse an action document.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] when the text is not JSON, lacks a
    /// `type`, names an unknown type, or carries a payload that does not
    /// fit the named type.
    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        let value: Value = serde_json::from_str(raw).map_err(ActionError::NotJson)?;
        Self::parse_value(value)
    }

    /// Strictly parse an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`Action::parse`], minus the JSON syntax case.
    pub fn parse_value(value: Value) -> Result<Self, ActionError> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ActionError::MissingType)?
            .to_string();

        if !Self::TAGS.contains(&tag.as_str()) {
            return Err(ActionError::UnknownType(tag));
        }

        serde_json::from_value(value).map_err(|source| ActionError::Malformed { tag, source })
    }

    /// Leniently decode an action; anything unusable becomes
    /// [`Action::Unknown`].
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|err| {
            tracing::warn!(code = %err.code(), "ignoring action: {err}");
            Self::Unknown
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    #[test]
    fn parses_update_with_numeric_id() {
        let action = Action::parse(
            r#"{"type": "UPDATE_OPPORTUNITY", "payload": {"id": 1, "patch": {"status": "First Interview"}}}"#,
        )
        .expect("parse update");
        let Action::UpdateOpportunity { id, patch } = action else {
            panic!("wrong variant");
        };
        assert_eq!(id.as_str(), "1");
        assert_eq!(patch.status, Some(Status::FirstInterview));
    }

    #[test]
    fn parses_bare_id_payloads() {
        let action = Action::parse(r#"{"type": "DELETE_OPPORTUNITY", "payload": "abc"}"#)
            .expect("parse delete");
        assert_eq!(action, Action::DeleteOpportunity(EntityId::new("abc")));

        let action = Action::parse(r#"{"payload": 42, "type": "DELETE_EVENT"}"#)
            .expect("payload before type");
        assert_eq!(action, Action::DeleteEvent(EntityId::from(42_u64)));
    }

    #[test]
    fn parses_chat_message_aliases() {
        let action = Action::parse(
            r#"{"type": "ADD_CHAT_MESSAGE", "payload": {"applicationId": 7, "message": "hi", "sender": "ai"}}"#,
        )
        .expect("parse chat");
        assert_eq!(
            action,
            Action::AddChatMessage {
                opportunity_id: EntityId::from(7_u64),
                text: "hi".into(),
                sender: Sender::Assistant,
            }
        );
    }

    #[test]
    fn unknown_type_is_reported_and_decoded_as_unknown() {
        let raw = r#"{"type": "RESET_EVERYTHING", "payload": null}"#;
        assert!(matches!(Action::parse(raw), Err(ActionError::UnknownType(t)) if t == "RESET_EVERYTHING"));
        assert_eq!(Action::decode(raw), Action::Unknown);
    }

    #[test]
    fn malformed_payloads_decode_as_unknown() {
        let raw = r#"{"type": "ADD_EVENT", "payload": [1, 2, 3]}"#;
        assert!(matches!(Action::parse(raw), Err(ActionError::Malformed { .. })));
        assert_eq!(Action::decode(raw), Action::Unknown);
        assert_eq!(Action::decode("not json"), Action::Unknown);
        assert_eq!(Action::decode(r#"{"payload": 1}"#), Action::Unknown);
    }

    #[test]
    fn serialized_actions_parse_back() {
        let action = Action::UpdateOpportunity {
            id: EntityId::new("9"),
            patch: OpportunityPatch::status(Status::Applied),
        };
        let json = serde_json::to_string(&action).expect("serialize");
        assert!(json.contains("\"UPDATE_OPPORTUNITY\""));
        assert_eq!(Action::parse(&json).expect("parse back"), action);
    }

    #[test]
    fn every_tag_is_listed() {
        let samples = [
            Action::DeleteOpportunity(EntityId::new("1")),
            Action::SetMasterResume(String::new()),
            Action::LoadData(LoadData::default()),
        ];
        for action in samples {
            assert!(Action::TAGS.contains(&action.tag()));
        }
        assert!(!Action::TAGS.contains(&Action::Unknown.tag()));
    }
}
