//! # Domain Errors

use thiserror::Error;

/// Energy validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnergyError {
    /// Amounts must be positive.
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Not enough energy.
    #[error("Insufficient energy: have {current}, need {required}")]
    Insufficient {
        /// Energy available.
        current: u32,
        /// Energy requested.
        required: u32,
    },

    /// A refill needs room to fill.
    #[error("Energy already full")]
    AlreadyFull,

    /// Refills must cost something.
    #[error("Price must be greater than zero")]
    ZeroPrice,

    /// Configuration rejected.
    #[error("Invalid energy configuration: {0}")]
    InvalidConfig(String),
}
