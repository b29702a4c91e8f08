//! # RL-05 Energy
//!
//! Energy counters gating run starts.
//!
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! - Regeneration is computed locally from an injected
//!   [`TimeSource`](shared_types::TimeSource): one unit per interval up to
//!   the cap
//! - `consume` regenerates first, then spends optimistically
//! - `purchase_refill` fills to the cap and debits the ledger, all or
//!   nothing

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::{EnergyConfig, DEFAULT_MAX_ENERGY, DEFAULT_REGEN_INTERVAL_SECS};
pub use domain::{EnergyError, EnergyRecord, EnergySnapshot, EnergyState};
pub use ports::{EnergyApi, EnergyGateway};
pub use service::EnergyService;
