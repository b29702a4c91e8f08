//! # Outbound Ports

use crate::domain::{RunResult, SessionReceipt, SessionRequest, SessionTicket};
use async_trait::async_trait;
use shared_types::{GatewayError, RemoteReply};

/// Server gateway for run sessions.
///
/// `'static` because cancellation notices outlive the calling task.
#[async_trait]
pub trait SessionGateway: Send + Sync + 'static {
    /// Request a new session.
    async fn request_session(
        &self,
        request: &SessionRequest,
    ) -> Result<RemoteReply<SessionTicket>, GatewayError>;

    /// Submit the result of `session_id`.
    async fn submit_session(
        &self,
        session_id: &str,
        result: &RunResult,
    ) -> Result<RemoteReply<SessionReceipt>, GatewayError>;

    /// Tell the server `session_id` was abandoned.
    async fn cancel_session(&self, session_id: &str) -> Result<(), GatewayError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use shared_types::CurrencyAmount;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[derive(Debug, Clone)]
    pub enum Scripted {
        Reject(String),
        Fail(GatewayError),
    }

    #[derive(Default)]
    pub struct MockSessionGateway {
        pub script: Mutex<VecDeque<Scripted>>,
        pub calls: Mutex<Vec<String>>,
        pub cancelled: Mutex<Vec<String>>,
        pub cancel_error: Mutex<Option<GatewayError>>,
        /// When set, requests wait for a notification before answering.
        pub hold: Mutex<Option<Arc<Notify>>>,
        issued: Mutex<u64>,
    }

    impl MockSessionGateway {
        pub fn push(&self, scripted: Scripted) {
            self.script.lock().push_back(scripted);
        }

        pub fn hold_responses(&self) -> Arc<Notify> {
            let notify = Arc::new(Notify::new());
            *self.hold.lock() = Some(notify.clone());
            notify
        }

        async fn answer<T>(
            &self,
            call: String,
            accept: impl FnOnce() -> T,
        ) -> Result<RemoteReply<T>, GatewayError> {
            self.calls.lock().push(call);
            let hold = self.hold.lock().clone();
            if let Some(notify) = hold {
                notify.notified().await;
            }
            match self.script.lock().pop_front() {
                Some(Scripted::Reject(reason)) => Ok(RemoteReply::Rejected(reason)),
                Some(Scripted::Fail(error)) => Err(error),
                None => Ok(RemoteReply::Accepted(accept())),
            }
        }
    }

    #[async_trait]
    impl SessionGateway for MockSessionGateway {
        async fn request_session(
            &self,
            request: &SessionRequest,
        ) -> Result<RemoteReply<SessionTicket>, GatewayError> {
            let id = {
                let mut issued = self.issued.lock();
                *issued += 1;
                *issued
            };
            self.answer(format!("request:{}", request.track_id), || SessionTicket {
                session_id: format!("session-{id}"),
                seed: id * 7919,
                issued_at_ms: 1_000 * id,
            })
            .await
        }

        async fn submit_session(
            &self,
            session_id: &str,
            result: &RunResult,
        ) -> Result<RemoteReply<SessionReceipt>, GatewayError> {
            let receipt = SessionReceipt {
                session_id: session_id.to_string(),
                accepted_score: result.score,
                reward: CurrencyAmount::soft(u64::from(result.coins)),
            };
            self.answer(format!("submit:{session_id}"), || receipt).await
        }

        async fn cancel_session(&self, session_id: &str) -> Result<(), GatewayError> {
            self.cancelled.lock().push(session_id.to_string());
            match self.cancel_error.lock().clone() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }
    }
}
