//! # Error Types
//!
//! Transport-level failures and the shape of every mutating server reply.

use crate::results::RollbackCategory;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure of the remote gateway itself (the request did not produce a
/// business answer).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GatewayError {
    /// The call did not complete within its deadline.
    #[error("Gateway timeout")]
    Timeout,

    /// The server could not be reached.
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    /// The server answered with something the client could not interpret.
    #[error("Gateway protocol error: {0}")]
    Protocol(String),

    /// Any other unexpected failure.
    #[error("Gateway internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Timeouts and generic connectivity failures are worth retrying;
    /// anything else is not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Timeout | GatewayError::Unavailable(_))
    }

    /// Rollback category for an operation that failed with this error.
    #[must_use]
    pub const fn category(&self) -> RollbackCategory {
        if self.is_retryable() {
            RollbackCategory::Transient
        } else {
            RollbackCategory::Critical
        }
    }
}

/// Business-level answer to a mutating gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteReply<T> {
    /// The server applied the mutation; carries the authoritative result.
    Accepted(T),
    /// The server refused on business grounds (e.g. insufficient balance).
    Rejected(String),
    /// The server reports that the client's view has diverged.
    Conflict(String),
}

impl<T> RemoteReply<T> {
    /// Whether the server applied the mutation.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, RemoteReply::Accepted(_))
    }

    /// Map the accepted payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RemoteReply<U> {
        match self {
            RemoteReply::Accepted(v) => RemoteReply::Accepted(f(v)),
            RemoteReply::Rejected(r) => RemoteReply::Rejected(r),
            RemoteReply::Conflict(r) => RemoteReply::Conflict(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GatewayError::Timeout.is_retryable());
        assert!(GatewayError::Unavailable("offline".into()).is_retryable());
        assert!(!GatewayError::Protocol("bad json".into()).is_retryable());
        assert!(!GatewayError::Internal("boom".into()).is_retryable());
    }

    #[test]
    fn test_category_follows_retryability() {
        assert_eq!(GatewayError::Timeout.category(), RollbackCategory::Transient);
        assert_eq!(
            GatewayError::Internal("boom".into()).category(),
            RollbackCategory::Critical
        );
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::Unavailable("dns".into());
        assert!(err.to_string().contains("dns"));
    }

    #[test]
    fn test_reply_map() {
        let reply: RemoteReply<u64> = RemoteReply::Accepted(2);
        assert_eq!(reply.map(|v| v * 2), RemoteReply::Accepted(4));

        let rejected: RemoteReply<u64> = RemoteReply::Rejected("no".into());
        assert!(!rejected.map(|v| v + 1).is_accepted());
    }
}
