use serde::Serialize;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("question needs at least {min} options, got {got}")]
    TooFewOptions { min: usize, got: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("correct option {index} is out of range for {options} options")]
    CorrectOptionOutOfRange { index: usize, options: usize },

    #[error("quiz must contain at least one question")]
    EmptyQuiz,

    #[error("question {index} is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: Box<QuizError>,
    },
}

/// Fewest options a multiple-choice question may carry.
pub const MIN_OPTIONS: usize = 2;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One multiple-choice question together with its answer.
///
/// Not `Serialize`. The answer leaves the core only through a remediation
/// entry, after scoring; `QuestionView` carries no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    question: String,
    options: Vec<String>,
    correct_option_index: usize,
}

impl QuizQuestion {
    /// Validates and builds a question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the text or any option is blank, fewer than
    /// `MIN_OPTIONS` options are given, or the correct index is out of range.
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_option_index: usize,
    ) -> Result<Self, QuizError> {
        let question = question.into().trim().to_owned();
        if question.is_empty() {
            return Err(QuizError::EmptyQuestion);
        }
        if options.len() < MIN_OPTIONS {
            return Err(QuizError::TooFewOptions {
                min: MIN_OPTIONS,
                got: options.len(),
            });
        }
        if let Some(index) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuizError::EmptyOption { index });
        }
        if correct_option_index >= options.len() {
            return Err(QuizError::CorrectOptionOutOfRange {
                index: correct_option_index,
                options: options.len(),
            });
        }

        Ok(Self {
            question,
            options,
            correct_option_index,
        })
    }

    /// Question text.
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Options in presentation order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Zero-based index of the correct option.
    #[must_use]
    pub fn correct_option_index(&self) -> usize {
        self.correct_option_index
    }

    /// Literal text of the correct option.
    #[must_use]
    pub fn correct_answer(&self) -> &str {
        // index validated in `new`
        &self.options[self.correct_option_index]
    }

    /// Answer-free view of this question.
    #[must_use]
    pub fn view(&self) -> QuestionView {
        QuestionView {
            question: self.question.clone(),
            options: self.options.clone(),
        }
    }
}

/// Learner-facing shape of a question: text and options, never the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub question: String,
    pub options: Vec<String>,
}

//
// ─── QUIZ KEY ──────────────────────────────────────────────────────────────────
//

/// Ordered, non-empty set of questions authoritative for scoring.
///
/// Its length never changes once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizKey {
    questions: Vec<QuizQuestion>,
}

impl QuizKey {
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuiz` when no questions are supplied.
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }
        Ok(Self { questions })
    }

    /// Number of questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always `false` for a built key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&QuizQuestion> {
        self.questions.get(index)
    }

    /// Questions in order.
    pub fn iter(&self) -> impl Iterator<Item = &QuizQuestion> {
        self.questions.iter()
    }

    /// Answer-free views of every question, in order.
    #[must_use]
    pub fn views(&self) -> Vec<QuestionView> {
        self.questions.iter().map(QuizQuestion::view).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("option {i}")).collect()
    }

    #[test]
    fn question_trims_and_exposes_answer_text() {
        let q = QuizQuestion::new("  What is ownership? ", options(4), 2).unwrap();
        assert_eq!(q.question(), "What is ownership?");
        assert_eq!(q.correct_answer(), "option 2");
    }

    #[test]
    fn question_rejects_bad_shapes() {
        assert_eq!(
            QuizQuestion::new(" ", options(4), 0).unwrap_err(),
            QuizError::EmptyQuestion
        );
        assert_eq!(
            QuizQuestion::new("Q", options(1), 0).unwrap_err(),
            QuizError::TooFewOptions { min: 2, got: 1 }
        );
        assert_eq!(
            QuizQuestion::new("Q", vec!["a".into(), "  ".into()], 0).unwrap_err(),
            QuizError::EmptyOption { index: 1 }
        );
        assert_eq!(
            QuizQuestion::new("Q", options(4), 4).unwrap_err(),
            QuizError::CorrectOptionOutOfRange {
                index: 4,
                options: 4
            }
        );
    }

    #[test]
    fn empty_key_is_rejected() {
        assert_eq!(QuizKey::new(Vec::new()).unwrap_err(), QuizError::EmptyQuiz);
    }

    #[test]
    fn views_hide_the_answer() {
        let key = QuizKey::new(vec![QuizQuestion::new("Q1", options(3), 1).unwrap()]).unwrap();
        let views = key.views();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].question, "Q1");
        assert_eq!(views[0].options, options(3));
    }
}
