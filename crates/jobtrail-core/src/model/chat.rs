use super::id::EntityId;
use crate::error::ParseEnumError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    #[serde(alias = "ai", alias = "bot")]
    Assistant,
}

impl Sender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" | "ai" | "bot" => Ok(Self::Assistant),
            _ => Err(ParseEnumError {
                expected: "sender",
                got: s.to_string(),
            }),
        }
    }
}

/// One message in an opportunity's chat thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: EntityId,
    pub sender: Sender,
    #[serde(alias = "content")]
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Chat threads keyed by the owning opportunity's normalized id.
pub type ChatThreads = BTreeMap<EntityId, Vec<ChatMessage>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_accepts_aliases() {
        assert_eq!("AI".parse::<Sender>(), Ok(Sender::Assistant));
        let parsed: Sender = serde_json::from_str("\"ai\"").expect("alias");
        assert_eq!(parsed, Sender::Assistant);
        assert!("system".parse::<Sender>().is_err());
    }

    #[test]
    fn message_reads_content_alias() {
        let json = r#"{
            "id": "1-0",
            "sender": "user",
            "content": "How should I prepare?",
            "timestamp": "2024-01-01T12:00:00Z"
        }"#;
        let msg: ChatMessage = serde_json::from_str(json).expect("parse message");
        assert_eq!(msg.text, "How should I prepare?");
        assert_eq!(msg.sender, Sender::User);
    }
}
