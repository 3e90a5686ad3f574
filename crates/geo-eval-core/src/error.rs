//! Error taxonomy for analysis sessions
//!
//! Every error is fatal only to the phase in flight. The session keeps the
//! data it already had and the caller may start a fresh phase.

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeoError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeoError {
    /// Non-2xx status or network failure outside the record stream
    #[error("transport error: {message}")]
    Transport { status: Option<u16>, message: String },

    /// Malformed line or unrecognized stage tag
    #[error("framing error: {reason}")]
    Framing { line: Option<String>, reason: String },

    /// In-stream `error` record sent by the analysis service
    #[error("{0}")]
    Protocol(String),

    /// Blank required input or a rejected keyword edit
    #[error("{0}")]
    Validation(String),

    /// Unreadable or unparseable client configuration
    #[error("config error: {0}")]
    Config(String),
}

/// Discriminant of [`GeoError`], exposed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Framing,
    Protocol,
    Validation,
    Config,
}

impl GeoError {
    pub fn transport(message: impl Into<String>) -> Self {
        GeoError::Transport {
            status: None,
            message: message.into(),
        }
    }

    pub fn framing(reason: impl Into<String>) -> Self {
        GeoError::Framing {
            line: None,
            reason: reason.into(),
        }
    }

    /// Framing error that keeps the offending line for diagnostics
    pub fn framing_line(line: &str, reason: impl Into<String>) -> Self {
        GeoError::Framing {
            line: Some(line.to_string()),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GeoError::Transport { .. } => ErrorKind::Transport,
            GeoError::Framing { .. } => ErrorKind::Framing,
            GeoError::Protocol(_) => ErrorKind::Protocol,
            GeoError::Validation(_) => ErrorKind::Validation,
            GeoError::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<reqwest::Error> for GeoError {
    fn from(err: reqwest::Error) -> Self {
        GeoError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(GeoError::transport("down").kind(), ErrorKind::Transport);
        assert_eq!(GeoError::framing("bad").kind(), ErrorKind::Framing);
        assert_eq!(GeoError::Protocol("x".into()).kind(), ErrorKind::Protocol);
        assert_eq!(GeoError::Validation("y".into()).kind(), ErrorKind::Validation);
        assert_eq!(GeoError::Config("z".into()).kind(), ErrorKind::Config);
    }

    #[test]
    fn test_protocol_message_is_displayed_verbatim() {
        let err = GeoError::Protocol("Failed to start analysis: boom".into());
        assert_eq!(err.to_string(), "Failed to start analysis: boom");
    }

    #[test]
    fn test_framing_line_keeps_offending_line() {
        let err = GeoError::framing_line("{not json", "invalid JSON");
        match err {
            GeoError::Framing { line, reason } => {
                assert_eq!(line.as_deref(), Some("{not json"));
                assert_eq!(reason, "invalid JSON");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
