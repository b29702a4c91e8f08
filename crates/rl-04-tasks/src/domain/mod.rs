//! # Domain Layer

pub mod entities;
pub mod errors;
pub mod state;

pub use entities::{Task, TaskBook};
pub use errors::TaskError;
pub use state::{TasksSnapshot, TasksState};
