//! Status Reporting
//!
//! Every interaction ends with a short human-readable message and, on
//! failure, a machine-checkable [`ErrorKind`].

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::action::ActionError;
use crate::privacy::codec::DecodeError;
use crate::privacy::reveal::AuthError;
use crate::store::gateway::PersistError;

/// Machine-checkable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No identity, declined, or bad signature
    AuthFailed,
    /// Malformed sealed value
    DecodeError,
    /// Gateway unreachable or write rejected
    PersistError,
    /// Action preconditions not met
    ActionRejected,
    /// Selected city does not exist
    UnknownCity,
    /// Snapshot must be unlocked first
    SnapshotSealed,
}

impl ErrorKind {
    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::AuthFailed => "auth_failed",
            ErrorKind::DecodeError => "decode_error",
            ErrorKind::PersistError => "persist_error",
            ErrorKind::ActionRejected => "action_rejected",
            ErrorKind::UnknownCity => "unknown_city",
            ErrorKind::SnapshotSealed => "snapshot_sealed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    /// Operation in flight
    Pending,
    /// Completed
    Success,
    /// Completed with a non-fatal problem
    Warning,
    /// Aborted
    Error,
}

/// Last status shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Severity
    pub level: StatusLevel,
    /// Short message
    pub message: String,
    /// Error category, when something went wrong
    pub kind: Option<ErrorKind>,
}

impl StatusReport {
    /// Operation in flight.
    pub fn pending(message: impl Into<String>) -> Self {
        Self { level: StatusLevel::Pending, message: message.into(), kind: None }
    }

    /// Operation completed.
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: StatusLevel::Success, message: message.into(), kind: None }
    }

    /// Completed, but something non-fatal failed.
    pub fn warning(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { level: StatusLevel::Warning, message: message.into(), kind: Some(kind) }
    }

    /// Operation aborted.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { level: StatusLevel::Error, message: message.into(), kind: Some(kind) }
    }
}

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reveal authorization failed.
    #[error("authorization failed: {0}")]
    Auth(#[from] AuthError),

    /// Sealed value could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Gateway failure.
    #[error("persistence failed: {0}")]
    Persist(#[from] PersistError),

    /// Action rejected.
    #[error("action rejected: {0}")]
    Action(#[from] ActionError),

    /// City not on the board.
    #[error("unknown city: {0}")]
    UnknownCity(String),

    /// Snapshot was loaded sealed and has not been unlocked.
    #[error("snapshot is sealed; unlock it first")]
    SnapshotSealed,
}

impl SessionError {
    /// Machine-checkable category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Auth(_) => ErrorKind::AuthFailed,
            SessionError::Decode(_) => ErrorKind::DecodeError,
            SessionError::Persist(_) => ErrorKind::PersistError,
            SessionError::Action(ActionError::UnknownCity(_)) => ErrorKind::UnknownCity,
            SessionError::Action(_) => ErrorKind::ActionRejected,
            SessionError::UnknownCity(_) => ErrorKind::UnknownCity,
            SessionError::SnapshotSealed => ErrorKind::SnapshotSealed,
        }
    }

    /// Error status for this failure.
    pub fn to_status(&self) -> StatusReport {
        StatusReport::error(self.kind(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(SessionError::from(AuthError::Declined).kind(), ErrorKind::AuthFailed);
        assert_eq!(SessionError::from(DecodeError::InvalidHex).kind(), ErrorKind::DecodeError);
        assert_eq!(SessionError::from(PersistError::Unavailable).kind(), ErrorKind::PersistError);
        assert_eq!(SessionError::from(ActionError::NoActionsLeft(1)).kind(), ErrorKind::ActionRejected);
        assert_eq!(
            SessionError::from(ActionError::UnknownCity("Atlantis".into())).kind(),
            ErrorKind::UnknownCity
        );
        assert_eq!(SessionError::SnapshotSealed.kind(), ErrorKind::SnapshotSealed);
    }

    #[test]
    fn test_error_status() {
        let status = SessionError::from(AuthError::NoIdentity).to_status();
        assert_eq!(status.level, StatusLevel::Error);
        assert_eq!(status.kind, Some(ErrorKind::AuthFailed));
        assert!(status.message.contains("no identity"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::PersistError.to_string(), "persist_error");
        assert_eq!(serde_json::to_string(&ErrorKind::AuthFailed).unwrap(), "\"auth_failed\"");
    }
}
