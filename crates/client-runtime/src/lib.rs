//! # Rushlane Client Runtime
//!
//! Wires the domain services into one client.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and the service container
//! - `adapters/` - Gateway implementations (the simulated backend)
//! - `wiring/` - Background handlers reacting to bus events
//! - `runtime` - Startup and shutdown
//!
//! ## Dependency Graph
//!
//! ```text
//!                       ┌──────────────┐
//!                       │  Event Bus   │
//!                       └──────┬───────┘
//!                              │ publish
//!   ┌──────────┬──────────┬────┴─────┬──────────┬───────────┬─────────┐
//!   │ Currency │Inventory │Achievem. │  Tasks   │  Energy   │Referrals│ Session
//!   └────┬─────┴────┬─────┴────┬─────┴────┬─────┴─────┬─────┴────┬────┘
//!        ↑          │          │          │           │          │
//!        └──────────┴──────────┴── Ledger port ───────┴──────────┘
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod container;
pub mod runtime;
pub mod wiring;

pub use adapters::{Backend, Call, Fault, SimulatedBackend, World};
pub use container::{ClientConfig, ClientContainer, ConfigError, DomainReport};
pub use runtime::ClientRuntime;
pub use wiring::ResyncHandler;
