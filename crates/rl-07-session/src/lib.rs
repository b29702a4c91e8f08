//! # RL-07 Session
//!
//! Pessimistic run-session coordinator.
//!
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! Sessions gate scoring, so nothing is speculated: the state machine only
//! advances on the server's answer. At most one session is requesting or
//! active at a time. Every transition is published as
//! `SessionStateChanged`.

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    next_state, RunResult, SessionError, SessionEvent, SessionMachine, SessionReceipt,
    SessionRequest, SessionTicket, Transition,
};
pub use ports::{SessionApi, SessionGateway};
pub use service::SessionService;
