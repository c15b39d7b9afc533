use thiserror::Error;

use crate::model::{QuizError, RelevanceError};
use crate::scoring::SubmissionError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Relevance(#[from] RelevanceError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}
