//! # Session State Machine
//!
//! No local effect is applied until the server answers, so there is nothing
//! to snapshot or roll back. The machine only guards which request may be
//! issued next.
//!
//! ```text
//! [None] ──Start──→ [Requesting] ──Granted──→ [Active] ──Submit──→ [Submitting]
//!                        │                       │                      │
//!                        └──StartFailed──→ [Failed] ←──SubmitFailed─────┤
//!                                                │                      │
//!                        [Cancelled] ←──Cancel───┘           Accepted──→ [Completed]
//! ```

use super::errors::SessionError;
use shared_bus::ClientEvent;
use shared_types::SessionState;

/// Inputs driving the session machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// Client asks the server for a session.
    Start,
    /// Server granted the session.
    Granted,
    /// Server refused the start, or the call failed.
    StartFailed,
    /// Client submits the run result.
    Submit,
    /// Server accepted the result.
    Accepted,
    /// Server refused the result, or the call failed.
    SubmitFailed,
    /// Client abandons the active session.
    Cancel,
}

/// Pure transition table. `None` means the event is not allowed.
pub fn next_state(state: SessionState, event: SessionEvent) -> Option<SessionState> {
    use self::SessionEvent as E;
    use shared_types::SessionState as S;

    match (state, event) {
        (S::None | S::Completed | S::Failed | S::Cancelled, E::Start) => Some(S::Requesting),
        (S::Requesting, E::Granted) => Some(S::Active),
        (S::Requesting, E::StartFailed) => Some(S::Failed),
        (S::Active, E::Submit) => Some(S::Submitting),
        (S::Active, E::Cancel) => Some(S::Cancelled),
        (S::Submitting, E::Accepted) => Some(S::Completed),
        (S::Submitting, E::SubmitFailed) => Some(S::Failed),
        _ => None,
    }
}

/// One applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State before.
    pub previous: SessionState,
    /// State after.
    pub current: SessionState,
    /// Identifier held after the transition.
    pub session_id: Option<String>,
}

impl Transition {
    /// Bus notification for this transition.
    pub fn to_event(&self) -> ClientEvent {
        ClientEvent::SessionStateChanged {
            previous: self.previous,
            current: self.current,
            session_id: self.session_id.clone(),
        }
    }
}

/// Session lifecycle with the identifier it holds.
///
/// `epoch` counts resets; a response tagged with an older epoch belongs to
/// a session that no longer exists.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionMachine {
    state: SessionState,
    session_id: Option<String>,
    epoch: u64,
}

impl SessionMachine {
    /// Machine in `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Identifier of the granted session, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Reset counter.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// State `event` would lead to, or why it is refused.
    pub fn check(&self, event: SessionEvent) -> Result<SessionState, SessionError> {
        match event {
            SessionEvent::Start if self.state.is_in_flight() => {
                Err(SessionError::AlreadyInFlight(self.state))
            }
            SessionEvent::Submit | SessionEvent::Cancel if self.state != SessionState::Active => {
                Err(SessionError::NoActiveSession(self.state))
            }
            SessionEvent::Submit if self.session_id.is_none() => {
                Err(SessionError::MissingSessionId)
            }
            _ => next_state(self.state, event).ok_or(SessionError::InvalidTransition {
                from: self.state,
                event,
            }),
        }
    }

    /// Apply `event`. Every event except `Submit` drops the held identifier.
    pub fn apply(&mut self, event: SessionEvent) -> Result<Transition, SessionError> {
        self.transition(event, None)
    }

    /// Apply `Granted`, storing the server's identifier.
    pub fn grant(&mut self, session_id: String) -> Result<Transition, SessionError> {
        self.transition(SessionEvent::Granted, Some(session_id))
    }

    /// Apply `Submit`, returning the identifier to submit under.
    pub fn submit(&mut self) -> Result<(Transition, String), SessionError> {
        self.check(SessionEvent::Submit)?;
        let session_id = self
            .session_id
            .clone()
            .ok_or(SessionError::MissingSessionId)?;
        Ok((self.apply(SessionEvent::Submit)?, session_id))
    }

    /// Apply `Cancel`, returning the identifier that was dropped.
    pub fn cancel(&mut self) -> Result<(Transition, Option<String>), SessionError> {
        self.check(SessionEvent::Cancel)?;
        let dropped = self.session_id.clone();
        Ok((self.apply(SessionEvent::Cancel)?, dropped))
    }

    fn transition(
        &mut self,
        event: SessionEvent,
        granted: Option<String>,
    ) -> Result<Transition, SessionError> {
        let previous = self.state;
        let current = self.check(event)?;
        if event != SessionEvent::Submit {
            self.session_id = granted;
        }
        self.state = current;
        Ok(Transition {
            previous,
            current,
            session_id: self.session_id.clone(),
        })
    }

    /// Back to `None`, invalidating anything in flight. Returns the
    /// transition unless the machine was already idle.
    pub fn reset(&mut self) -> Option<Transition> {
        self.epoch += 1;
        self.session_id = None;
        let previous = std::mem::replace(&mut self.state, SessionState::None);
        (previous != SessionState::None).then_some(Transition {
            previous,
            current: SessionState::None,
            session_id: None,
        })
    }
}
