//! # Domain Errors

use super::machine::SessionEvent;
use shared_types::SessionState;
use thiserror::Error;

/// Session lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A start was requested while an attempt is outstanding.
    #[error("Session already in progress: {0}")]
    AlreadyInFlight(SessionState),

    /// Submit or cancel without an active session.
    #[error("No active session (state: {0})")]
    NoActiveSession(SessionState),

    /// Active but no identifier held.
    #[error("Active session has no identifier")]
    MissingSessionId,

    /// Event not allowed from the current state.
    #[error("Invalid session transition: {event:?} from {from}")]
    InvalidTransition {
        /// State the machine was in.
        from: SessionState,
        /// Event that was refused.
        event: SessionEvent,
    },
}
