//! # Wiring
//!
//! Background handlers reacting to bus events.

pub mod resync;

pub use resync::{ResyncHandler, RESYNC_ATTEMPTS};
