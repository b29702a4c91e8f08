//! # RL-01 Currency
//!
//! Soft and hard currency balances, updated optimistically.
//!
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! ## Purpose
//!
//! - `add` / `spend` show the new balance instantly and reconcile with the
//!   server receipt
//! - Acts as the [`Ledger`](shared_optimistic::Ledger) for every
//!   dual-resource claim and purchase in the other domains
//!
//! Currency depends on no other domain.
//!
//! ## Module Structure
//!
//! ```text
//! rl-01-currency/
//! ├── domain/     # CurrencyState, snapshot, CurrencyError
//! ├── ports/      # CurrencyApi (inbound) + CurrencyGateway (outbound)
//! └── service.rs  # CurrencyService
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{BalanceReceipt, BalanceSheet, CurrencyError, CurrencySnapshot, CurrencyState};
pub use ports::{CurrencyApi, CurrencyGateway};
pub use service::CurrencyService;
