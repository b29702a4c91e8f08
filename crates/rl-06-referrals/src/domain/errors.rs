//! # Domain Errors

use thiserror::Error;

/// Referral validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferralError {
    /// Code length outside the accepted range.
    #[error("Referral code must be 4-16 characters, got {0}")]
    InvalidLength(usize),

    /// Codes are ASCII letters and digits only.
    #[error("Referral code must be alphanumeric")]
    NotAlphanumeric,

    /// Players cannot refer themselves.
    #[error("Cannot apply your own referral code")]
    OwnCode,

    /// A code can only be applied once.
    #[error("Referral code already applied: {0}")]
    AlreadyReferred(String),

    /// No such referred player.
    #[error("Unknown referee: {0}")]
    UnknownReferee(String),

    /// Reward already taken.
    #[error("Referral reward already claimed: {0}")]
    AlreadyClaimed(String),
}
