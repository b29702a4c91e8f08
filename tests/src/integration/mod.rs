//! # Integration Tests
//!
//! Every flow drives the real services through a `ClientContainer` backed
//! by `SimulatedBackend`, so both the client view and the server's records
//! can be asserted.

pub mod fixtures;

mod claim_flows;
mod currency_flows;
mod lifecycle;
mod session_flows;
