use serde::Serialize;

/// Explanatory content for one missed question.
///
/// Always derived from a `QuizResult`; `correct_answer` is the option text,
/// not its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemediationEntry {
    pub question_index: usize,
    pub question: String,
    pub explanation: String,
    pub correct_answer: String,
}
