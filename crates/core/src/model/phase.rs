use serde::{Deserialize, Serialize};
use std::fmt;

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Position of the learner in the guided session lifecycle.
///
/// ```text
/// Input ──start──▶ Learning ──begin_quiz──▶ Quiz ──submit──▶ Complete
///                     ▲                                        │
///                     └──finish_review── Remediation ◀─review──┘
/// ```
///
/// `reset` leads back to `Input` from every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Input,
    Learning,
    Quiz,
    Remediation,
    Complete,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Input,
        Phase::Learning,
        Phase::Quiz,
        Phase::Remediation,
        Phase::Complete,
    ];

    /// Looks up the phase reached by applying `event` in this phase.
    ///
    /// Returns `None` when the event is illegal here. This is the only place
    /// the transition table lives; guards on session data (non-empty topic,
    /// missed questions to review) are checked by the caller.
    #[must_use]
    pub fn next(self, event: SessionEvent) -> Option<Phase> {
        use Phase::{Complete, Input, Learning, Quiz, Remediation};
        use SessionEvent::{BeginQuiz, FinishReview, RequestReview, Reset, Start, SubmitAnswers};

        match (self, event) {
            (_, Reset) => Some(Input),
            (Input, Start) => Some(Learning),
            (Learning, BeginQuiz) => Some(Quiz),
            (Quiz, SubmitAnswers) => Some(Complete),
            (Complete, RequestReview) => Some(Remediation),
            (Remediation, FinishReview) => Some(Learning),
            (Input | Learning | Quiz | Remediation | Complete, _) => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Input => "input",
            Phase::Learning => "learning",
            Phase::Quiz => "quiz",
            Phase::Remediation => "remediation",
            Phase::Complete => "complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

/// External events a session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    Start,
    BeginQuiz,
    SubmitAnswers,
    RequestReview,
    FinishReview,
    Reset,
}

impl SessionEvent {
    pub const ALL: [SessionEvent; 6] = [
        SessionEvent::Start,
        SessionEvent::BeginQuiz,
        SessionEvent::SubmitAnswers,
        SessionEvent::RequestReview,
        SessionEvent::FinishReview,
        SessionEvent::Reset,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionEvent::Start => "start",
            SessionEvent::BeginQuiz => "begin_quiz",
            SessionEvent::SubmitAnswers => "submit_answers",
            SessionEvent::RequestReview => "request_review",
            SessionEvent::FinishReview => "finish_review",
            SessionEvent::Reset => "reset",
        }
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
