use async_trait::async_trait;

use learn_core::model::{QuizKey, QuizQuestion, RelevanceScore};

use super::{ContentGenerator, Explanation, StudyMaterial};
use crate::error::GenerationError;

/// In-process generator that always returns the same material.
///
/// Useful offline and in tests. Explanations are assembled from the quiz key
/// itself, one per missed index, in the requested order.
#[derive(Debug, Clone)]
pub struct StaticContentGenerator {
    material: StudyMaterial,
}

impl StaticContentGenerator {
    #[must_use]
    pub fn new(material: StudyMaterial) -> Self {
        Self { material }
    }

    /// A four-question primer on Rust ownership.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` only if the built-in material fails validation.
    pub fn ownership_primer() -> Result<Self, GenerationError> {
        let question = |text: &str, options: [&str; 4], correct: usize| {
            QuizQuestion::new(text, options.map(String::from).to_vec(), correct)
        };

        let quiz = QuizKey::new(vec![
            question(
                "What happens to a `String` after it is moved into another variable?",
                [
                    "Both variables own it",
                    "The original variable can no longer be used",
                    "It is copied bit for bit",
                    "It is dropped immediately",
                ],
                1,
            )?,
            question(
                "How many mutable references to a value may exist at once?",
                ["Any number", "Two", "One", "None"],
                2,
            )?,
            question(
                "When is an owned value dropped?",
                [
                    "When its owner goes out of scope",
                    "When the program exits",
                    "When the garbage collector runs",
                    "Never",
                ],
                0,
            )?,
            question(
                "Which trait lets a type be duplicated implicitly on assignment?",
                ["Clone", "Drop", "Send", "Copy"],
                3,
            )?,
        ])?;

        let summary = "\
- **Ownership**: every value has exactly one owner at a time.
- **Moves**: assigning a non-`Copy` value transfers ownership; the old binding is invalid.
- **Borrowing**: any number of shared `&T` or exactly one `&mut T` at a time.
- **Drop**: a value is freed when its owner goes out of scope.
- **Copy**: small plain types are duplicated implicitly instead of moved.";

        Ok(Self::new(StudyMaterial {
            summary: summary.to_string(),
            relevance_score: RelevanceScore::new(100.0)?,
            quiz,
        }))
    }
}

#[async_trait]
impl ContentGenerator for StaticContentGenerator {
    async fn generate_study_material(
        &self,
        _topic: &str,
        _objectives: &[String],
    ) -> Result<StudyMaterial, GenerationError> {
        Ok(self.material.clone())
    }

    async fn explain_missed(
        &self,
        quiz: &QuizKey,
        missed_indices: &[usize],
    ) -> Result<Vec<Explanation>, GenerationError> {
        Ok(missed_indices
            .iter()
            .filter_map(|&index| {
                quiz.get(index).map(|question| Explanation {
                    question_index: index,
                    text: format!(
                        "Go back to \"{}\". The answer is \"{}\"; re-read the summary point that mentions it.",
                        question.question(),
                        question.correct_answer()
                    ),
                })
            })
            .collect())
    }
}
