//! # Operation Results
//!
//! The tagged outcome returned by every domain operation, and the rollback
//! notification emitted when a speculative mutation is undone.

use crate::entities::Domain;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reason returned when a second operation hits a busy domain.
pub const OPERATION_PENDING: &str = "operation pending";

/// Why a rollback happened. Drives retry and presentation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollbackCategory {
    /// Retryable network issue.
    Transient,
    /// Server explicitly rejected the mutation.
    BusinessRule,
    /// Client and server state diverged; a full resync is required.
    StateConflict,
    /// Unexpected failure; the feature is unreliable until resynced.
    Critical,
}

impl RollbackCategory {
    /// Presentation layers surface everything except transient auto-retries.
    #[must_use]
    pub const fn should_notify_user(self) -> bool {
        !matches!(self, RollbackCategory::Transient)
    }

    /// Stable lowercase label used for metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RollbackCategory::Transient => "transient",
            RollbackCategory::BusinessRule => "business_rule",
            RollbackCategory::StateConflict => "state_conflict",
            RollbackCategory::Critical => "critical",
        }
    }
}

impl fmt::Display for RollbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification that a speculative mutation was reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackEvent {
    /// Correlates the rollback with the operation's log lines.
    pub operation_id: Uuid,
    /// Domain whose state was restored.
    pub domain: Domain,
    /// Operation name, e.g. `currency.add`.
    pub operation_type: String,
    /// Human-readable cause.
    pub reason: String,
    /// Whether the UI should surface this rollback.
    pub should_notify_user: bool,
    /// Classification of the failure.
    pub category: RollbackCategory,
}

impl RollbackEvent {
    /// Build a rollback event; `should_notify_user` follows the category.
    #[must_use]
    pub fn new(
        operation_id: Uuid,
        domain: Domain,
        operation_type: impl Into<String>,
        reason: impl Into<String>,
        category: RollbackCategory,
    ) -> Self {
        Self {
            operation_id,
            domain,
            operation_type: operation_type.into(),
            reason: reason.into(),
            should_notify_user: category.should_notify_user(),
            category,
        }
    }
}

/// Outcome of a domain operation.
///
/// `RolledBack` and `NetworkError` are only returned after local state has
/// been restored to its pre-operation snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationResult<T> {
    /// The server accepted the mutation.
    Success(T),
    /// The server refused; local state was restored.
    RolledBack {
        /// Why the server refused.
        reason: String,
        /// Rollback classification.
        category: RollbackCategory,
    },
    /// The call failed in transport; local state was restored.
    NetworkError {
        /// Transport failure description.
        cause: String,
        /// Whether retrying may succeed.
        retryable: bool,
    },
    /// Input was invalid or the domain was busy; nothing was mutated.
    ValidationError(String),
    /// The operation was abandoned before completion (e.g. sign-out).
    Cancelled,
}

impl<T> OperationResult<T> {
    /// True iff the remote call was accepted.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success(_))
    }

    /// Whether a caller may retry this outcome.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, OperationResult::NetworkError { retryable: true, .. })
    }

    /// The success payload, if any.
    pub fn success(self) -> Option<T> {
        match self {
            OperationResult::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the success payload, if any.
    #[must_use]
    pub const fn as_success(&self) -> Option<&T> {
        match self {
            OperationResult::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Map the success payload, keeping failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        match self {
            OperationResult::Success(v) => OperationResult::Success(f(v)),
            OperationResult::RolledBack { reason, category } => {
                OperationResult::RolledBack { reason, category }
            }
            OperationResult::NetworkError { cause, retryable } => {
                OperationResult::NetworkError { cause, retryable }
            }
            OperationResult::ValidationError(r) => OperationResult::ValidationError(r),
            OperationResult::Cancelled => OperationResult::Cancelled,
        }
    }

    /// Short outcome label used for metrics.
    #[must_use]
    pub const fn outcome_label(&self) -> &'static str {
        match self {
            OperationResult::Success(_) => "success",
            OperationResult::RolledBack { .. } => "rolled_back",
            OperationResult::NetworkError { .. } => "network_error",
            OperationResult::ValidationError(_) => "validation_error",
            OperationResult::Cancelled => "cancelled",
        }
    }

    /// Failure description, if the result is not a success.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            OperationResult::Success(_) | OperationResult::Cancelled => None,
            OperationResult::RolledBack { reason, .. } => Some(reason),
            OperationResult::NetworkError { cause, .. } => Some(cause),
            OperationResult::ValidationError(r) => Some(r),
        }
    }
}

impl<T> fmt::Display for OperationResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationResult::Success(_) => write!(f, "success"),
            OperationResult::RolledBack { reason, category } => {
                write!(f, "rolled back ({category}): {reason}")
            }
            OperationResult::NetworkError { cause, retryable } => {
                write!(f, "network error (retryable={retryable}): {cause}")
            }
            OperationResult::ValidationError(r) => write!(f, "validation error: {r}"),
            OperationResult::Cancelled => write!(f, "cancelled"),
        }
    }
}
