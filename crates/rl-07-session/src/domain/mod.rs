//! # Domain Layer

pub mod entities;
pub mod errors;
pub mod machine;

pub use entities::{RunResult, SessionReceipt, SessionRequest, SessionTicket};
pub use errors::SessionError;
pub use machine::{next_state, SessionEvent, SessionMachine, Transition};
