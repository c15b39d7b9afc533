//! Content-generation collaborators: study material, quizzes and explanations.

mod chat;
mod fixed;

use async_trait::async_trait;

use learn_core::model::{QuizKey, RelevanceScore};

use crate::error::GenerationError;

pub use chat::{ChatContentGenerator, ContentConfig};
pub use fixed::StaticContentGenerator;

/// Material produced for a freshly started session.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyMaterial {
    pub summary: String,
    pub relevance_score: RelevanceScore,
    pub quiz: QuizKey,
}

/// Explanation of one missed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub question_index: usize,
    pub text: String,
}

/// Upstream service that authors study material and remediation text.
///
/// Calls may be slow network round trips; callers must not assume they are
/// cheap or retried.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produce a summary, relevance score and quiz for a topic.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` if the upstream call fails or its output is invalid.
    async fn generate_study_material(
        &self,
        topic: &str,
        objectives: &[String],
    ) -> Result<StudyMaterial, GenerationError>;

    /// Explain each missed question, one explanation per index, in the given order.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` if the upstream call fails.
    async fn explain_missed(
        &self,
        quiz: &QuizKey,
        missed_indices: &[usize],
    ) -> Result<Vec<Explanation>, GenerationError>;
}
