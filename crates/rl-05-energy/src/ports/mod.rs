//! # Ports Layer
//!
//! - **Inbound**: [`EnergyApi`], implemented by the service
//! - **Outbound**: [`EnergyGateway`], implemented by a transport adapter

pub mod inbound;
pub mod outbound;

pub use inbound::EnergyApi;
pub use outbound::EnergyGateway;
