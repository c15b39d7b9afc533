use std::env;

use learn_core::model::DEFAULT_MASTERY_THRESHOLD;

/// Session-level knobs shared by every store built from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Score (percent) at or above which a result counts as mastered.
    pub mastery_threshold: u8,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mastery_threshold: DEFAULT_MASTERY_THRESHOLD,
        }
    }
}

impl SessionSettings {
    /// Reads `LEARN_MASTERY_THRESHOLD`. Values above 100 are clamped; missing
    /// or unparsable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_raw(env::var("LEARN_MASTERY_THRESHOLD").ok().as_deref())
    }

    fn from_raw(raw: Option<&str>) -> Self {
        let mastery_threshold = raw
            .and_then(parse_threshold)
            .unwrap_or(DEFAULT_MASTERY_THRESHOLD);
        Self { mastery_threshold }
    }

    /// Overrides the threshold, clamped to 100.
    #[must_use]
    pub fn with_mastery_threshold(mut self, threshold: u8) -> Self {
        self.mastery_threshold = threshold.min(100);
        self
    }
}

fn parse_threshold(raw: &str) -> Option<u8> {
    let value = raw.trim().parse::<u32>().ok()?;
    u8::try_from(value.min(100)).ok()
}
