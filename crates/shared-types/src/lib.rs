//! # Shared Types Crate
//!
//! Contains the vocabulary every client domain speaks: the tagged
//! [`OperationResult`], rollback classification, gateway failures and the
//! currency amounts used by dual-resource operations.
//!
//! ## Design Principles
//!
//! - **Server is truth**: every mutating gateway reply is a [`RemoteReply`];
//!   local state only ever speculates ahead of it.
//! - **Categorised rollback**: a [`RollbackCategory`] travels unchanged from
//!   the coordinator to metrics and subscribers.
//! - **No exceptions across the coordinator**: transport faults are values
//!   ([`GatewayError`]) with a retryable classification.

pub mod entities;
pub mod errors;
pub mod results;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use results::*;
pub use time::*;
