//! Shared error types for the services crate.

use thiserror::Error;

use learn_core::model::{InvalidTransition, QuizError, RelevanceError, SessionEvent};
use learn_core::scoring::SubmissionError;

use crate::remediation::RemediationMismatch;

/// Errors raised by content-generation collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("content generation is not configured")]
    Disabled,
    #[error("content service returned an empty response")]
    EmptyResponse,
    #[error("content service request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("content service returned an unreadable payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("material is not relevant enough to the topic ({score:.1}% < {min:.1}%)")]
    Irrelevant { score: f32, min: f32 },
    #[error("generated quiz is invalid: {0}")]
    InvalidQuiz(#[from] QuizError),
    #[error(transparent)]
    InvalidRelevance(#[from] RelevanceError),
    #[error("content service unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by session events.
///
/// Every variant aborts only the event that raised it; the session is left as
/// it was before the call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("topic cannot be empty")]
    EmptyTopic,
    #[error("malformed submission: {0}")]
    MalformedSubmission(#[from] SubmissionError),
    #[error("content generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    RemediationMismatch(#[from] RemediationMismatch),
    #[error("{event} is already in progress for this session")]
    SessionBusy { event: SessionEvent },
}

impl SessionError {
    /// Stable machine-readable code for transports.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidTransition(_) => "invalid_transition",
            SessionError::EmptyTopic => "empty_topic",
            SessionError::MalformedSubmission(_) => "malformed_submission",
            SessionError::Generation(_) => "generation_error",
            SessionError::RemediationMismatch(_) => "remediation_mismatch",
            SessionError::SessionBusy { .. } => "session_busy",
        }
    }
}
