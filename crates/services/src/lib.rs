#![forbid(unsafe_code)]

pub mod content;
pub mod error;
pub mod remediation;
pub mod sessions;

pub use learn_core::Clock;
pub use sessions as session;

pub use content::{
    ChatContentGenerator, ContentConfig, ContentGenerator, Explanation, StaticContentGenerator,
    StudyMaterial,
};
pub use error::{GenerationError, SessionError};
pub use remediation::{RemediationMismatch, RemediationSelector};
pub use sessions::{
    ResultView, SessionRegistry, SessionSettings, SessionStateMachine, SessionStore, SessionView,
};
