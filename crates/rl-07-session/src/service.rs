//! # Session Service
//!
//! Pessimistic coordinator: the machine lock is held only around
//! transitions, never across the gateway call. A response is applied only
//! if no reset happened while it was in flight.

use crate::domain::{
    RunResult, SessionError, SessionEvent, SessionMachine, SessionReceipt, SessionRequest,
    SessionTicket, Transition,
};
use crate::ports::{SessionApi, SessionGateway};
use async_trait::async_trait;
use client_telemetry::{record_operation, record_session_transition, EVENT_BUS_MESSAGES_SENT};
use futures::FutureExt;
use parking_lot::Mutex;
use shared_bus::EventPublisher;
use shared_types::{
    Domain, GatewayError, OperationResult, RemoteReply, RollbackCategory, SessionState,
};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, info, info_span, warn, Instrument};

/// Run-session service.
pub struct SessionService<G: SessionGateway> {
    machine: Mutex<SessionMachine>,
    gateway: Arc<G>,
    bus: Arc<dyn EventPublisher>,
}

impl<G: SessionGateway> SessionService<G> {
    /// Create a service in `None`.
    pub fn new(gateway: Arc<G>, bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            machine: Mutex::new(SessionMachine::new()),
            gateway,
            bus,
        }
    }

    fn emit(&self, transition: &Transition) {
        info!(
            from = %transition.previous,
            to = %transition.current,
            session_id = ?transition.session_id,
            "Session transition"
        );
        record_session_transition(transition.previous.as_str(), transition.current.as_str());
        EVENT_BUS_MESSAGES_SENT.inc();
        self.bus.publish(transition.to_event());
    }

    /// Apply a local transition, returning the epoch it happened in.
    fn begin<T>(
        &self,
        apply: impl FnOnce(&mut SessionMachine) -> Result<(Transition, T), SessionError>,
    ) -> Result<(u64, T), SessionError> {
        let mut machine = self.machine.lock();
        let (transition, value) = apply(&mut *machine)?;
        self.emit(&transition);
        Ok((machine.epoch(), value))
    }

    /// Apply the server's answer, unless a reset superseded the request.
    fn finish<T>(
        &self,
        epoch: u64,
        reply: Result<RemoteReply<T>, GatewayError>,
        accept: impl FnOnce(&mut SessionMachine, &T) -> Result<Transition, SessionError>,
        failed: SessionEvent,
    ) -> OperationResult<T> {
        let mut machine = self.machine.lock();
        if machine.epoch() != epoch {
            debug!("Session response arrived after reset; discarding");
            return OperationResult::Cancelled;
        }

        let (transition, result) = match reply {
            Ok(RemoteReply::Accepted(value)) => {
                (accept(&mut *machine, &value), OperationResult::Success(value))
            }
            Ok(RemoteReply::Rejected(reason)) => (
                machine.apply(failed),
                OperationResult::RolledBack {
                    reason,
                    category: RollbackCategory::BusinessRule,
                },
            ),
            Ok(RemoteReply::Conflict(reason)) => (
                machine.apply(failed),
                OperationResult::RolledBack {
                    reason,
                    category: RollbackCategory::StateConflict,
                },
            ),
            Err(error) => {
                warn!(%error, "Session call failed");
                (
                    machine.apply(failed),
                    OperationResult::NetworkError {
                        cause: error.to_string(),
                        retryable: error.is_retryable(),
                    },
                )
            }
        };

        match transition {
            Ok(transition) => {
                self.emit(&transition);
                result
            }
            Err(error) => {
                warn!(%error, "Session response did not match machine state");
                OperationResult::ValidationError(error.to_string())
            }
        }
    }

    fn notify_cancelled(&self, session_id: String) {
        let gateway = Arc::clone(&self.gateway);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(error) = gateway.cancel_session(&session_id).await {
                        warn!(%session_id, %error, "Session cancel notice failed");
                    }
                });
            }
            Err(_) => warn!(%session_id, "No runtime; session cancel notice not sent"),
        }
    }
}

/// A panicking gateway call still has to resolve the in-flight state.
async fn guarded<T>(
    call: impl Future<Output = Result<RemoteReply<T>, GatewayError>>,
) -> Result<RemoteReply<T>, GatewayError> {
    AssertUnwindSafe(call)
        .catch_unwind()
        .await
        .unwrap_or_else(|_| Err(GatewayError::Internal("gateway call panicked".into())))
}

fn timed<T>(started: Instant, result: OperationResult<T>) -> OperationResult<T> {
    record_operation(
        Domain::Session.as_str(),
        result.outcome_label(),
        started.elapsed().as_secs_f64(),
    );
    result
}

#[async_trait]
impl<G: SessionGateway> SessionApi for SessionService<G> {
    async fn start(&self, request: SessionRequest) -> OperationResult<SessionTicket> {
        let started = Instant::now();
        let span = info_span!("session_op", operation = "session.start", track = %request.track_id);

        let result = async {
            let epoch = match self.begin(|m| m.apply(SessionEvent::Start).map(|t| (t, ()))) {
                Ok((epoch, ())) => epoch,
                Err(error) => return OperationResult::ValidationError(error.to_string()),
            };
            let reply = guarded(self.gateway.request_session(&request)).await;
            self.finish(
                epoch,
                reply,
                |m, ticket| m.grant(ticket.session_id.clone()),
                SessionEvent::StartFailed,
            )
        }
        .instrument(span)
        .await;

        timed(started, result)
    }

    async fn submit(&self, result: RunResult) -> OperationResult<SessionReceipt> {
        let started = Instant::now();
        let span = info_span!("session_op", operation = "session.submit", score = result.score);

        let outcome = async {
            let (epoch, session_id) = match self.begin(SessionMachine::submit) {
                Ok(begun) => begun,
                Err(error) => return OperationResult::ValidationError(error.to_string()),
            };
            let reply = guarded(self.gateway.submit_session(&session_id, &result)).await;
            self.finish(
                epoch,
                reply,
                |m, _| m.apply(SessionEvent::Accepted),
                SessionEvent::SubmitFailed,
            )
        }
        .instrument(span)
        .await;

        timed(started, outcome)
    }

    fn cancel(&self) -> OperationResult<()> {
        match self.begin(SessionMachine::cancel) {
            Ok((_, Some(session_id))) => {
                self.notify_cancelled(session_id);
                OperationResult::Success(())
            }
            Ok((_, None)) => OperationResult::Success(()),
            Err(error) => OperationResult::ValidationError(error.to_string()),
        }
    }

    fn state(&self) -> SessionState {
        self.machine.lock().state()
    }

    fn session_id(&self) -> Option<String> {
        self.machine.lock().session_id().map(str::to_owned)
    }

    fn reset(&self) {
        let mut machine = self.machine.lock();
        if let Some(transition) = machine.reset() {
            self.emit(&transition);
        }
    }
}
