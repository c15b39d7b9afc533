use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum RelevanceError {
    #[error("relevance score must be within 0..=100, got {0}")]
    OutOfRange(f32),
}

/// How well gathered material covers the requested topic, in percent.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct RelevanceScore(f32);

impl RelevanceScore {
    pub const MAX: f32 = 100.0;

    /// # Errors
    ///
    /// Returns `RelevanceError::OutOfRange` for values outside `0..=100` or NaN.
    pub fn new(value: f32) -> Result<Self, RelevanceError> {
        if !(0.0..=Self::MAX).contains(&value) {
            return Err(RelevanceError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }
}

impl fmt::Display for RelevanceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}
