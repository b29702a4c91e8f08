//! # Client Container
//!
//! Configuration plus the container holding every domain service, wired
//! to one bus and one ledger.

pub mod config;
pub mod services;

pub use config::{ClientConfig, ConfigError};
pub use services::{ClientContainer, DomainReport};
