//! # Ports Layer
//!
//! - **Inbound**: [`ReferralsApi`], implemented by the service
//! - **Outbound**: [`ReferralsGateway`], implemented by a transport adapter

pub mod inbound;
pub mod outbound;

pub use inbound::ReferralsApi;
pub use outbound::ReferralsGateway;
