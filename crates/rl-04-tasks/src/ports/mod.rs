//! # Ports Layer
//!
//! - **Inbound**: [`TasksApi`], implemented by the service
//! - **Outbound**: [`TasksGateway`], implemented by a transport adapter

pub mod inbound;
pub mod outbound;

pub use inbound::TasksApi;
pub use outbound::TasksGateway;
