use std::fmt;

/// Machine-readable error codes surfaced by the host shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    OpportunityNotFound,
    EventNotFound,
    InvalidEnumValue,
    MalformedAction,
    CorruptSnapshot,
    SnapshotWriteFailed,
    LockContention,
    IntegrityViolation,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::OpportunityNotFound => "E2001",
            Self::EventNotFound => "E2002",
            Self::InvalidEnumValue => "E2003",
            Self::MalformedAction => "E2004",
            Self::CorruptSnapshot => "E3001",
            Self::SnapshotWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::IntegrityViolation => "E6001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::OpportunityNotFound => "Opportunity not found",
            Self::EventNotFound => "Calendar event not found",
            Self::InvalidEnumValue => "Invalid status/event-type/sender value",
            Self::MalformedAction => "Malformed action document",
            Self::CorruptSnapshot => "Corrupt state snapshot",
            Self::SnapshotWriteFailed => "Snapshot write failed",
            Self::LockContention => "Lock contention",
            Self::IntegrityViolation => "State integrity violation",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in jobtrail/config.toml and retry."),
            Self::OpportunityNotFound | Self::EventNotFound => {
                Some("Run `jt list` or `jt event list` to see known ids.")
            }
            Self::InvalidEnumValue => {
                Some("Use one of the documented status, event type, or sender values.")
            }
            Self::MalformedAction => {
                Some("Actions are JSON objects of the form {\"type\": ..., \"payload\": ...}.")
            }
            Self::CorruptSnapshot => {
                Some("Restore the snapshot from a backup or move it aside to start fresh.")
            }
            Self::SnapshotWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `jt` process releases its lock."),
            Self::IntegrityViolation => Some("Run `jt doctor` to list the offending records."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {expected}: '{got}'")]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl ParseEnumError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidEnumValue
    }
}
