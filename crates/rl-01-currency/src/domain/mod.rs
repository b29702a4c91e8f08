//! # Domain Layer
//!
//! Currency state, its snapshot and validation errors.

pub mod entities;
pub mod errors;
pub mod state;

pub use entities::{BalanceReceipt, BalanceSheet};
pub use errors::CurrencyError;
pub use state::{CurrencySnapshot, CurrencyState};
