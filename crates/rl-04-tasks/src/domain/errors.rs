//! # Domain Errors

use thiserror::Error;

/// Task validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// No task with this id.
    #[error("Unknown task: {0}")]
    Unknown(String),

    /// Increments must be positive.
    #[error("Delta must be greater than zero")]
    ZeroDelta,

    /// Claimed tasks take no more progress and no second claim.
    #[error("Task already claimed: {0}")]
    AlreadyClaimed(String),

    /// Target not reached.
    #[error("Task {id} incomplete: {progress}/{target}")]
    Incomplete {
        /// Task id.
        id: String,
        /// Current progress.
        progress: u32,
        /// Required progress.
        target: u32,
    },

    /// Configuration rejected.
    #[error("Invalid task configuration: {0}")]
    InvalidConfig(String),
}
