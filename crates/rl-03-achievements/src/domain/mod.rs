//! # Domain Layer

pub mod entities;
pub mod errors;
pub mod state;

pub use entities::{Achievement, AchievementBook};
pub use errors::AchievementError;
pub use state::{AchievementsSnapshot, AchievementsState};
