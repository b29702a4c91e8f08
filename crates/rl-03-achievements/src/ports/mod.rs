//! # Ports Layer
//!
//! - **Inbound**: [`AchievementsApi`], implemented by the service
//! - **Outbound**: [`AchievementsGateway`], implemented by a transport adapter

pub mod inbound;
pub mod outbound;

pub use inbound::AchievementsApi;
pub use outbound::AchievementsGateway;
