//! # Ports Layer
//!
//! - **Inbound**: [`SessionApi`], implemented by the service
//! - **Outbound**: [`SessionGateway`], implemented by a transport adapter

pub mod inbound;
pub mod outbound;

pub use inbound::SessionApi;
pub use outbound::SessionGateway;
