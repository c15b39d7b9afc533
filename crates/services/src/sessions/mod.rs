mod machine;
mod registry;
mod settings;
mod store;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use machine::SessionStateMachine;
pub use registry::SessionRegistry;
pub use settings::SessionSettings;
pub use store::SessionStore;
pub use view::{ResultView, SessionView};
