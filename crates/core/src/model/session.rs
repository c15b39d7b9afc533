use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    Phase, QuizKey, QuizResult, RelevanceScore, RemediationEntry, SessionEvent, SessionId,
};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot {event} while in {phase} phase")]
pub struct InvalidTransition {
    pub phase: Phase,
    pub event: SessionEvent,
}

/// Everything a successful `start` commits at once.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyPlan {
    pub id: SessionId,
    pub topic: String,
    pub objectives: Vec<String>,
    pub study_material: String,
    pub relevance_score: RelevanceScore,
    pub quiz_key: QuizKey,
    pub started_at: DateTime<Utc>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// The single live guided session of a learner.
///
/// Every mutator first resolves the transition through [`Phase::next`] and
/// returns [`InvalidTransition`] without touching any field when the event is
/// illegal. `Session::default()` is the initial, post-reset state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    id: Option<SessionId>,
    topic: String,
    objectives: Vec<String>,
    study_material: String,
    relevance_score: RelevanceScore,
    quiz_key: Option<QuizKey>,
    last_result: Option<QuizResult>,
    remediation: Vec<RemediationEntry>,
    attempts: u32,
    started_at: Option<DateTime<Utc>>,
    submitted_at: Option<DateTime<Utc>>,
    phase: Phase,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the phase `event` would lead to.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the event is illegal in the current phase.
    pub fn ensure(&self, event: SessionEvent) -> Result<Phase, InvalidTransition> {
        self.phase.next(event).ok_or(InvalidTransition {
            phase: self.phase,
            event,
        })
    }

    /// Commits freshly generated material, discarding any prior result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the session is in `Input`.
    pub fn start(&mut self, plan: StudyPlan) -> Result<(), InvalidTransition> {
        let next = self.ensure(SessionEvent::Start)?;
        *self = Self {
            id: Some(plan.id),
            topic: plan.topic,
            objectives: plan.objectives,
            study_material: plan.study_material,
            relevance_score: plan.relevance_score,
            quiz_key: Some(plan.quiz_key),
            started_at: Some(plan.started_at),
            phase: next,
            ..Self::default()
        };
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the session is in `Learning`.
    pub fn begin_quiz(&mut self) -> Result<(), InvalidTransition> {
        self.phase = self.ensure(SessionEvent::BeginQuiz)?;
        Ok(())
    }

    /// Stores a scored submission, replacing the previous result, and hands
    /// back the stored result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the session is in `Quiz`.
    pub fn record_result(
        &mut self,
        result: QuizResult,
        submitted_at: DateTime<Utc>,
    ) -> Result<&QuizResult, InvalidTransition> {
        let next = self.ensure(SessionEvent::SubmitAnswers)?;
        self.remediation.clear();
        self.attempts = self.attempts.saturating_add(1);
        self.submitted_at = Some(submitted_at);
        self.phase = next;
        Ok(self.last_result.insert(result))
    }

    /// Whether `request_review` is currently allowed by both phase and data.
    #[must_use]
    pub fn can_review(&self) -> bool {
        self.ensure(SessionEvent::RequestReview).is_ok()
            && self.last_result.as_ref().is_some_and(QuizResult::has_missed)
    }

    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the session is in `Complete` with at
    /// least one missed question.
    pub fn open_review(&mut self, entries: Vec<RemediationEntry>) -> Result<(), InvalidTransition> {
        if !self.can_review() {
            return Err(InvalidTransition {
                phase: self.phase,
                event: SessionEvent::RequestReview,
            });
        }
        self.remediation = entries;
        self.phase = Phase::Remediation;
        Ok(())
    }

    /// Sends the learner back to the same material; the quiz key is kept.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the session is in `Remediation`.
    pub fn finish_review(&mut self) -> Result<(), InvalidTransition> {
        let next = self.ensure(SessionEvent::FinishReview)?;
        self.remediation.clear();
        self.phase = next;
        Ok(())
    }

    /// Discards everything and returns to `Input`. Legal from every phase.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Id minted by the last `start`; `None` before the first.
    #[must_use]
    pub fn id(&self) -> Option<SessionId> {
        self.id
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Topic the learner asked for.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn objectives(&self) -> &[String] {
        &self.objectives
    }

    /// Generated summary shown during `Learning`.
    #[must_use]
    pub fn study_material(&self) -> &str {
        &self.study_material
    }

    #[must_use]
    pub fn relevance_score(&self) -> RelevanceScore {
        self.relevance_score
    }

    /// Committed quiz key, answers included.
    #[must_use]
    pub fn quiz_key(&self) -> Option<&QuizKey> {
        self.quiz_key.as_ref()
    }

    /// Most recent scored submission.
    #[must_use]
    pub fn last_result(&self) -> Option<&QuizResult> {
        self.last_result.as_ref()
    }

    /// Entries present only during `Remediation`.
    #[must_use]
    pub fn remediation(&self) -> &[RemediationEntry] {
        &self.remediation
    }

    /// Number of successful submissions since `start`.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// When the current material was committed.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the last submission was scored.
    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }
}
