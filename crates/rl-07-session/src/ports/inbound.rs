//! # Inbound Ports

use crate::domain::{RunResult, SessionReceipt, SessionRequest, SessionTicket};
use async_trait::async_trait;
use shared_types::{OperationResult, SessionState};

/// Session API - inbound port.
///
/// Nothing changes locally until the server answers.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Ask the server for a run session. Refused while another attempt is
    /// outstanding.
    async fn start(&self, request: SessionRequest) -> OperationResult<SessionTicket>;

    /// Submit the result of the active session.
    async fn submit(&self, result: RunResult) -> OperationResult<SessionReceipt>;

    /// Abandon the active session. Local state changes at once; the server
    /// is told in the background.
    fn cancel(&self) -> OperationResult<()>;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Identifier of the granted session, if any.
    fn session_id(&self) -> Option<String>;

    /// Back to `None` (sign-out). Responses still in flight are discarded.
    fn reset(&self);
}
