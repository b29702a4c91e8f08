//! # Domain Layer

pub mod entities;
pub mod errors;
pub mod state;

pub use entities::EnergyRecord;
pub use errors::EnergyError;
pub use state::{EnergySnapshot, EnergyState};
