//! # Domain Errors

use thiserror::Error;

/// Achievement validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AchievementError {
    /// No achievement with this id.
    #[error("Unknown achievement: {0}")]
    Unknown(String),

    /// Progress only moves forward.
    #[error("Progress for {id} is already {current}, reported {reported}")]
    NoProgress {
        /// Achievement id.
        id: String,
        /// Current local progress.
        current: u32,
        /// Reported progress.
        reported: u32,
    },

    /// Target not reached yet.
    #[error("Achievement not unlocked: {0}")]
    Locked(String),

    /// Reward already taken.
    #[error("Achievement already claimed: {0}")]
    AlreadyClaimed(String),
}
