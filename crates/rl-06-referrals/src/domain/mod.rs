//! # Domain Layer

pub mod entities;
pub mod errors;
pub mod state;

pub use entities::{Referee, ReferralRecord, MAX_CODE_LEN, MIN_CODE_LEN};
pub use errors::ReferralError;
pub use state::{validate_code, ReferralSnapshot, ReferralState};
