//! Failure taxonomy for a conversation round trip.
//!
//! Every remote-facing failure is caught at the controller boundary and turned
//! into one user-visible string; the distinguishing kind is kept for logging.

use std::time::Duration;

use thiserror::Error;

/// The remote session could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionInitError {
    #[error("session misconfigured: {0}")]
    Misconfigured(String),
    #[error("session transport failure: {0}")]
    Transport(String),
    #[error("session creation timed out after {0:?}")]
    Timeout(Duration),
}

/// A message could not be exchanged over an existing session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("no session is available")]
    NoSession,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("blocked by safety filter: {reason}")]
    SafetyBlocked { reason: String },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("response contained no text")]
    EmptyResponse,
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Reserved for real translator implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("translation from {source_lang} to {target_lang} failed: {message}")]
pub struct TranslationError {
    pub source_lang: String,
    pub target_lang: String,
    pub message: String,
}

/// Why a submitted turn did not produce an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Session(#[from] SessionInitError),
    #[error(transparent)]
    Send(#[from] SendError),
    #[error(transparent)]
    Translation(#[from] TranslationError),
}

impl SubmitError {
    /// Stable identifier used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmitError::Session(SessionInitError::Misconfigured(_)) => "session_misconfigured",
            SubmitError::Session(SessionInitError::Transport(_)) => "session_transport",
            SubmitError::Session(SessionInitError::Timeout(_)) => "session_timeout",
            SubmitError::Send(SendError::NoSession) => "no_session",
            SubmitError::Send(SendError::Transport(_)) => "transport",
            SubmitError::Send(SendError::Api { .. }) => "api",
            SubmitError::Send(SendError::SafetyBlocked { .. }) => "safety_blocked",
            SubmitError::Send(SendError::Timeout(_)) => "timeout",
            SubmitError::Send(SendError::EmptyResponse) => "empty_response",
            SubmitError::Send(SendError::Malformed(_)) => "malformed_response",
            SubmitError::Translation(_) => "translation",
        }
    }

    /// The single string shown on the display surface.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Send(SendError::SafetyBlocked { .. }) => {
                "The response was blocked by the safety filter, please rephrase and try again"
                    .to_string()
            }
            SubmitError::Send(SendError::Timeout(_))
            | SubmitError::Session(SessionInitError::Timeout(_)) => {
                "The assistant took too long to answer, please try again".to_string()
            }
            SubmitError::Session(SessionInitError::Misconfigured(detail)) => {
                format!("The assistant is not configured correctly: {detail}")
            }
            _ => "Failed to send a message, please try again later".to_string(),
        }
    }

    pub fn is_safety_block(&self) -> bool {
        matches!(self, SubmitError::Send(SendError::SafetyBlocked { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_block_is_distinct_from_transport() {
        let blocked = SubmitError::from(SendError::SafetyBlocked {
            reason: "SAFETY".into(),
        });
        let transport = SubmitError::from(SendError::Transport("reset".into()));

        assert!(blocked.is_safety_block());
        assert!(!transport.is_safety_block());
        assert_ne!(blocked.kind(), transport.kind());
        assert_ne!(blocked.user_message(), transport.user_message());
    }

    #[test]
    fn generic_failures_share_the_fallback_message() {
        let api = SubmitError::from(SendError::Api {
            status: 429,
            message: "quota".into(),
        });
        assert_eq!(
            api.user_message(),
            "Failed to send a message, please try again later"
        );
        assert_eq!(api.kind(), "api");
    }

    #[test]
    fn display_keeps_detail_for_logs() {
        let err = SubmitError::from(SessionInitError::Transport("dns".into()));
        assert_eq!(err.to_string(), "session transport failure: dns");
    }
}
