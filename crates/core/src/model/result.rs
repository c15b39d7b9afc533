use serde::Serialize;

/// Score (percent) at or above which a quiz counts as mastered.
pub const DEFAULT_MASTERY_THRESHOLD: u8 = 70;

/// Outcome of one quiz submission.
///
/// Only the scoring engine builds these; a later submission replaces the
/// previous result rather than merging into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QuizResult {
    score: u8,
    missed_indices: Vec<usize>,
    answered_count: usize,
}

impl QuizResult {
    pub(crate) fn new(score: u8, missed_indices: Vec<usize>, answered_count: usize) -> Self {
        Self {
            score,
            missed_indices,
            answered_count,
        }
    }

    /// Whole-number percentage of correct answers, `0..=100`.
    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    /// Strictly increasing positions of the questions answered wrong.
    #[must_use]
    pub fn missed_indices(&self) -> &[usize] {
        &self.missed_indices
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answered_count
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answered_count - self.missed_indices.len()
    }

    #[must_use]
    pub fn has_missed(&self) -> bool {
        !self.missed_indices.is_empty()
    }

    #[must_use]
    pub fn is_mastered(&self, threshold: u8) -> bool {
        self.score >= threshold
    }
}
