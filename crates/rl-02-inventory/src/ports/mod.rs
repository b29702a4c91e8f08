//! # Ports Layer
//!
//! - **Inbound**: [`InventoryApi`], implemented by the service
//! - **Outbound**: [`InventoryGateway`], implemented by a transport adapter

pub mod inbound;
pub mod outbound;

pub use inbound::InventoryApi;
pub use outbound::InventoryGateway;
