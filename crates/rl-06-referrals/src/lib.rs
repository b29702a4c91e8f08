//! # RL-06 Referrals
//!
//! Referral codes and referral reward claims.
//!
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! A player may name one referrer, once. Each player they refer yields a
//! reward that is claimed through the currency ledger.

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    validate_code, Referee, ReferralError, ReferralRecord, ReferralSnapshot, ReferralState,
};
pub use ports::{ReferralsApi, ReferralsGateway};
pub use service::ReferralsService;
