//! # Domain Errors
//!
//! Local validation failures of the currency domain.

use shared_types::CurrencyType;
use thiserror::Error;

/// Currency validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// Amounts must be positive.
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// The credit would overflow the balance.
    #[error("Balance overflow: {balance} {currency} + {amount}")]
    Overflow {
        /// Currency being credited.
        currency: CurrencyType,
        /// Current balance.
        balance: u64,
        /// Requested credit.
        amount: u64,
    },

    /// Not enough currency for the spend.
    #[error("Insufficient {currency}: have {balance}, need {required}")]
    InsufficientBalance {
        /// Currency being spent.
        currency: CurrencyType,
        /// Current balance.
        balance: u64,
        /// Requested spend.
        required: u64,
    },
}
