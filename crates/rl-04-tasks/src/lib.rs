//! # RL-04 Tasks
//!
//! Task progress and reward claims.
//!
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! ## Batching
//!
//! ```text
//! increment("T1", 3) ──┐
//! increment("T1", 4) ──┼──→ local progress 7, pending {T1: 7}
//!                      │
//!           timer tick / explicit flush
//!                      │
//!                      ▼
//!           update_progress({T1: 7})
//!                      │
//!      accepted ───────┼──────── refused ──────────── transport error
//!   adopt server +     │     subtract deltas,        requeue + restart
//!   unsent deltas      │     one rollback            the timer
//! ```
//!
//! A claim flushes first and holds the flush slot until it completes.

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::{TaskConfig, DEFAULT_FLUSH_INTERVAL_MS};
pub use domain::{Task, TaskBook, TaskError, TasksSnapshot, TasksState};
pub use ports::{TasksApi, TasksGateway};
pub use service::{ProgressBatch, TasksService};
