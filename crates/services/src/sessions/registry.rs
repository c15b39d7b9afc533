use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use learn_core::model::LearnerId;

use super::settings::SessionSettings;
use super::store::SessionStore;
use crate::Clock;
use crate::content::ContentGenerator;

/// One isolated [`SessionStore`] per learner.
///
/// `acquire` creates a learner's store on first use; `release` drops it, which
/// discards that learner's session. Learners never share a session.
pub struct SessionRegistry {
    content: Arc<dyn ContentGenerator>,
    clock: Clock,
    settings: SessionSettings,
    stores: Mutex<HashMap<LearnerId, Arc<SessionStore>>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(content: Arc<dyn ContentGenerator>, clock: Clock, settings: SessionSettings) -> Self {
        Self {
            content,
            clock,
            settings,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// The learner's store, created on first use.
    #[must_use]
    pub fn acquire(&self, learner: LearnerId) -> Arc<SessionStore> {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        let store = stores.entry(learner).or_insert_with(|| {
            debug!(%learner, "creating session store");
            Arc::new(SessionStore::new(
                Arc::clone(&self.content),
                self.clock,
                self.settings,
            ))
        });
        Arc::clone(store)
    }

    /// Drops the learner's store. Returns whether one existed.
    ///
    /// Handles already acquired keep working but are no longer reachable
    /// through the registry.
    pub fn release(&self, learner: LearnerId) -> bool {
        let removed = self
            .stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&learner)
            .is_some();
        if removed {
            debug!(%learner, "session store released");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
