use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;

use learn_core::model::{Phase, QuestionView, QuizResult, RemediationEntry, Session, SessionEvent};

use super::machine::SessionStateMachine;
use super::settings::SessionSettings;
use super::view::SessionView;
use crate::Clock;
use crate::content::ContentGenerator;
use crate::error::SessionError;

/// Owns the single live session of one learner.
///
/// Events are serialized: the machine sits behind an async mutex that is held
/// for the whole event, collaborator call included. An event that is already
/// pending is not queued a second time; the duplicate fails with
/// `SessionError::SessionBusy`.
pub struct SessionStore {
    machine: AsyncMutex<SessionStateMachine>,
    in_flight: Mutex<Vec<SessionEvent>>,
    settings: SessionSettings,
}

/// Registration of a pending event, released on drop.
#[derive(Debug)]
struct InFlight<'a> {
    events: &'a Mutex<Vec<SessionEvent>>,
    event: SessionEvent,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = events.iter().position(|e| *e == self.event) {
            events.swap_remove(pos);
        }
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(content: Arc<dyn ContentGenerator>, clock: Clock, settings: SessionSettings) -> Self {
        Self {
            machine: AsyncMutex::new(SessionStateMachine::new(content, clock)),
            in_flight: Mutex::new(Vec::new()),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Whether any event is currently pending.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    fn enter(&self, event: SessionEvent) -> Result<InFlight<'_>, SessionError> {
        let mut events = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if events.contains(&event) {
            warn!(%event, "duplicate event while one is pending");
            return Err(SessionError::SessionBusy { event });
        }
        events.push(event);
        Ok(InFlight {
            events: &self.in_flight,
            event,
        })
    }

    fn view_of(&self, session: &Session) -> SessionView {
        SessionView::from_session(session, self.settings.mastery_threshold)
    }

    //
    // ─── EVENTS ────────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// See [`SessionStateMachine::start`]; additionally `SessionError::SessionBusy`
    /// while another `start` is pending.
    pub async fn start(
        &self,
        topic: &str,
        objectives: &[String],
    ) -> Result<SessionView, SessionError> {
        let _pending = self.enter(SessionEvent::Start)?;
        let mut machine = self.machine.lock().await;
        machine.start(topic, objectives).await?;
        Ok(self.view_of(machine.session()))
    }

    /// # Errors
    ///
    /// See [`SessionStateMachine::begin_quiz`].
    pub async fn begin_quiz(&self) -> Result<SessionView, SessionError> {
        let _pending = self.enter(SessionEvent::BeginQuiz)?;
        let mut machine = self.machine.lock().await;
        machine.begin_quiz()?;
        Ok(self.view_of(machine.session()))
    }

    /// # Errors
    ///
    /// See [`SessionStateMachine::submit_answers`].
    pub async fn submit_answers(
        &self,
        answers: &[Option<usize>],
    ) -> Result<SessionView, SessionError> {
        let _pending = self.enter(SessionEvent::SubmitAnswers)?;
        let mut machine = self.machine.lock().await;
        machine.submit_answers(answers)?;
        Ok(self.view_of(machine.session()))
    }

    /// # Errors
    ///
    /// See [`SessionStateMachine::request_review`]; additionally
    /// `SessionError::SessionBusy` while another review request is pending.
    pub async fn request_review(&self) -> Result<SessionView, SessionError> {
        let _pending = self.enter(SessionEvent::RequestReview)?;
        let mut machine = self.machine.lock().await;
        machine.request_review().await?;
        Ok(self.view_of(machine.session()))
    }

    /// # Errors
    ///
    /// See [`SessionStateMachine::finish_review`].
    pub async fn finish_review(&self) -> Result<SessionView, SessionError> {
        let _pending = self.enter(SessionEvent::FinishReview)?;
        let mut machine = self.machine.lock().await;
        machine.finish_review()?;
        Ok(self.view_of(machine.session()))
    }

    /// Tear the session down and return to `Input`.
    ///
    /// Waits for any pending event to finish first; pending events are never
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionBusy` only if another reset is pending.
    pub async fn reset(&self) -> Result<SessionView, SessionError> {
        let _pending = self.enter(SessionEvent::Reset)?;
        let mut machine = self.machine.lock().await;
        machine.reset();
        Ok(self.view_of(machine.session()))
    }

    //
    // ─── READS ─────────────────────────────────────────────────────────────────
    //

    pub async fn view(&self) -> SessionView {
        let machine = self.machine.lock().await;
        self.view_of(machine.session())
    }

    pub async fn phase(&self) -> Phase {
        self.machine.lock().await.session().phase()
    }

    /// Answer-free questions, available only while the quiz is open.
    pub async fn questions(&self) -> Option<Vec<QuestionView>> {
        let machine = self.machine.lock().await;
        let session = machine.session();
        if session.phase() != Phase::Quiz {
            return None;
        }
        session.quiz_key().map(|q| q.views())
    }

    pub async fn result(&self) -> Option<QuizResult> {
        self.machine.lock().await.session().last_result().cloned()
    }

    pub async fn remediation(&self) -> Vec<RemediationEntry> {
        self.machine.lock().await.session().remediation().to_vec()
    }

    /// Full copy of the session, quiz key included. Not for learner-facing use.
    pub async fn snapshot(&self) -> Session {
        self.machine.lock().await.session().clone()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("settings", &self.settings)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}
