use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use learn_core::model::{
    InvalidTransition, QuizResult, RemediationEntry, Session, SessionEvent, SessionId, StudyPlan,
};
use learn_core::scoring;

use crate::Clock;
use crate::content::ContentGenerator;
use crate::error::SessionError;
use crate::remediation::RemediationSelector;

//
// ─── STATE MACHINE ─────────────────────────────────────────────────────────────
//

/// Drives one [`Session`] through its lifecycle.
///
/// Each event checks its phase first, then does all fallible work (collaborator
/// calls, scoring, remediation assembly) and commits only at the end, so a
/// failed event leaves the session exactly as it found it.
///
/// This type is not synchronized; [`super::SessionStore`] wraps it for
/// concurrent callers.
pub struct SessionStateMachine {
    session: Session,
    content: Arc<dyn ContentGenerator>,
    selector: RemediationSelector,
    clock: Clock,
}

impl SessionStateMachine {
    #[must_use]
    pub fn new(content: Arc<dyn ContentGenerator>, clock: Clock) -> Self {
        Self {
            session: Session::new(),
            content,
            selector: RemediationSelector::new(),
            clock,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Generate material for `topic` and enter `Learning`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Input`,
    /// `SessionError::EmptyTopic` for a blank topic, and
    /// `SessionError::Generation` if the collaborator fails.
    pub async fn start(&mut self, topic: &str, objectives: &[String]) -> Result<(), SessionError> {
        self.guard(SessionEvent::Start)?;

        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SessionError::EmptyTopic);
        }
        let objectives: Vec<String> = objectives
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_owned)
            .collect();

        let material = self
            .content
            .generate_study_material(topic, &objectives)
            .await?;

        let id = SessionId::generate();
        let questions = material.quiz.len();
        self.session.start(StudyPlan {
            id,
            topic: topic.to_owned(),
            objectives,
            study_material: material.summary,
            relevance_score: material.relevance_score,
            quiz_key: material.quiz,
            started_at: self.clock.now(),
        })?;

        info!(
            session_id = %id,
            topic,
            questions,
            relevance = material.relevance_score.value(),
            "session started"
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Learning`.
    pub fn begin_quiz(&mut self) -> Result<(), SessionError> {
        self.session.begin_quiz()?;
        self.log_transition(SessionEvent::BeginQuiz);
        Ok(())
    }

    /// Score `answers` and move to `Complete`.
    ///
    /// `None` marks an unanswered question and is rejected.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Quiz` and
    /// `SessionError::MalformedSubmission` for a wrong answer count, a missing
    /// answer or an out-of-range option.
    pub fn submit_answers(&mut self, answers: &[Option<usize>]) -> Result<&QuizResult, SessionError> {
        self.guard(SessionEvent::SubmitAnswers)?;
        let quiz = self.session.quiz_key().ok_or(InvalidTransition {
            phase: self.session.phase(),
            event: SessionEvent::SubmitAnswers,
        })?;

        let result = scoring::score(quiz, answers)?;
        let session_id = self.session.id();
        let recorded = self.session.record_result(result, self.clock.now())?;

        info!(
            session_id = ?session_id,
            score = recorded.score(),
            missed = recorded.missed_indices().len(),
            "quiz scored"
        );
        Ok(recorded)
    }

    /// Fetch remediation for the missed questions and enter `Remediation`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Complete` or when
    /// nothing was missed, `SessionError::Generation` if the collaborator fails
    /// and `SessionError::RemediationMismatch` if its output is misaligned.
    pub async fn request_review(&mut self) -> Result<&[RemediationEntry], SessionError> {
        let event = SessionEvent::RequestReview;
        if !self.session.can_review() {
            let err = InvalidTransition {
                phase: self.session.phase(),
                event,
            };
            warn!(%err, "review rejected");
            return Err(err.into());
        }
        let (Some(quiz), Some(result)) = (self.session.quiz_key(), self.session.last_result())
        else {
            return Err(InvalidTransition {
                phase: self.session.phase(),
                event,
            }
            .into());
        };

        let entries = self
            .selector
            .select(self.content.as_ref(), quiz, result.missed_indices())
            .await?;
        self.session.open_review(entries)?;

        self.log_transition(event);
        Ok(self.session.remediation())
    }

    /// Return to `Learning` with the same material and quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Remediation`.
    pub fn finish_review(&mut self) -> Result<(), SessionError> {
        self.session.finish_review()?;
        self.log_transition(SessionEvent::FinishReview);
        Ok(())
    }

    /// Discard the session. Always succeeds.
    pub fn reset(&mut self) {
        let previous = self.session.id();
        self.session.reset();
        info!(session_id = ?previous, "session reset");
    }

    fn guard(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.session.ensure(event).map(|_| ()).map_err(|err| {
            warn!(%err, "event rejected");
            err.into()
        })
    }

    fn log_transition(&self, event: SessionEvent) {
        info!(
            session_id = ?self.session.id(),
            %event,
            phase = %self.session.phase(),
            "session transition"
        );
    }
}

impl fmt::Debug for SessionStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStateMachine")
            .field("session_id", &self.session.id())
            .field("phase", &self.session.phase())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
