//! # Rushlane Test Suite
//!
//! Cross-domain flows run against the simulated backend.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs        # World and client setup
//!     ├── currency_flows.rs  # Balance changes and single-flight
//!     ├── claim_flows.rs     # Dual-resource claims and purchases
//!     ├── session_flows.rs   # Run sessions and rewards
//!     └── lifecycle.rs       # Bootstrap, resync and sign-out
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p rl-tests
//! cargo test -p rl-tests integration::claim_flows
//! ```

#![allow(dead_code)]

pub mod integration;
