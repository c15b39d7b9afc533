use serde::Serialize;

use learn_core::model::{
    Phase, QuestionView, QuizResult, RelevanceScore, RemediationEntry, Session, SessionId,
};

/// Public, transport-agnostic snapshot of a session.
///
/// Never carries a correct option index. Questions appear only while the quiz
/// is open; remediation entries (which name the correct answer) only after
/// scoring, during `Remediation`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub session_id: Option<SessionId>,
    pub phase: Phase,
    pub topic: String,
    pub summary: String,
    pub relevance_score: RelevanceScore,
    pub question_count: usize,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<QuestionView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remediation: Vec<RemediationEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub score: u8,
    pub missed_indices: Vec<usize>,
    pub answered_count: usize,
    pub correct_count: usize,
    pub mastered: bool,
}

impl ResultView {
    #[must_use]
    pub fn from_result(result: &QuizResult, mastery_threshold: u8) -> Self {
        Self {
            score: result.score(),
            missed_indices: result.missed_indices().to_vec(),
            answered_count: result.answered_count(),
            correct_count: result.correct_count(),
            mastered: result.is_mastered(mastery_threshold),
        }
    }
}

impl SessionView {
    #[must_use]
    pub fn from_session(session: &Session, mastery_threshold: u8) -> Self {
        let quiz = session.quiz_key();
        Self {
            session_id: session.id(),
            phase: session.phase(),
            topic: session.topic().to_string(),
            summary: session.study_material().to_string(),
            relevance_score: session.relevance_score(),
            question_count: quiz.map_or(0, |q| q.len()),
            attempts: session.attempts(),
            questions: quiz
                .filter(|_| session.phase() == Phase::Quiz)
                .map(|q| q.views()),
            result: session
                .last_result()
                .map(|r| ResultView::from_result(r, mastery_threshold)),
            remediation: session.remediation().to_vec(),
        }
    }
}
