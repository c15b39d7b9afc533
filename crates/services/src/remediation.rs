//! Builds remediation entries for the questions a learner missed.

use thiserror::Error;
use tracing::debug;

use learn_core::model::{QuizKey, RemediationEntry};

use crate::content::{ContentGenerator, Explanation};
use crate::error::SessionError;

/// The explanation source broke its one-per-missed-question contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RemediationMismatch {
    #[error("expected {expected} explanations, got {actual}")]
    Count { expected: usize, actual: usize },

    #[error("explanation {position} is for question {actual}, expected question {expected}")]
    Index {
        position: usize,
        expected: usize,
        actual: usize,
    },

    #[error("missed question {index} is not part of the quiz")]
    UnknownQuestion { index: usize },
}

/// Maps missed question positions onto learner-facing remediation entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemediationSelector;

impl RemediationSelector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Fetch explanations for `missed_indices` and assemble one entry per index.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Generation` if the collaborator fails, or
    /// `SessionError::RemediationMismatch` if its answer is not aligned 1:1.
    pub async fn select(
        &self,
        content: &dyn ContentGenerator,
        quiz: &QuizKey,
        missed_indices: &[usize],
    ) -> Result<Vec<RemediationEntry>, SessionError> {
        if let Some(&index) = missed_indices.iter().find(|&&i| i >= quiz.len()) {
            return Err(RemediationMismatch::UnknownQuestion { index }.into());
        }
        let explanations = content.explain_missed(quiz, missed_indices).await?;
        debug!(
            missed = missed_indices.len(),
            received = explanations.len(),
            "explanations received"
        );
        Ok(assemble(quiz, missed_indices, explanations)?)
    }
}

/// Pairs each missed index with its explanation, preserving `missed_indices` order.
///
/// # Errors
///
/// Returns `RemediationMismatch` on a count difference, an out-of-order or
/// foreign index, or a missed index outside the quiz.
pub fn assemble(
    quiz: &QuizKey,
    missed_indices: &[usize],
    explanations: Vec<Explanation>,
) -> Result<Vec<RemediationEntry>, RemediationMismatch> {
    if explanations.len() != missed_indices.len() {
        return Err(RemediationMismatch::Count {
            expected: missed_indices.len(),
            actual: explanations.len(),
        });
    }

    missed_indices
        .iter()
        .zip(explanations)
        .enumerate()
        .map(|(position, (&index, explanation))| {
            if explanation.question_index != index {
                return Err(RemediationMismatch::Index {
                    position,
                    expected: index,
                    actual: explanation.question_index,
                });
            }
            let question = quiz
                .get(index)
                .ok_or(RemediationMismatch::UnknownQuestion { index })?;
            Ok(RemediationEntry {
                question_index: index,
                question: question.question().to_string(),
                explanation: explanation.text,
                correct_answer: question.correct_answer().to_string(),
            })
        })
        .collect()
}
