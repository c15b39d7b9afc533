mod ids;
mod phase;
mod quiz;
mod relevance;
mod remediation;
mod result;
mod session;

pub use ids::{LearnerId, ParseIdError, SessionId};
pub use phase::{Phase, SessionEvent};
pub use quiz::{MIN_OPTIONS, QuestionView, QuizError, QuizKey, QuizQuestion};
pub use relevance::{RelevanceError, RelevanceScore};
pub use remediation::RemediationEntry;
pub use result::{DEFAULT_MASTERY_THRESHOLD, QuizResult};
pub use session::{InvalidTransition, Session, StudyPlan};
