//! # Ports Layer
//!
//! - **Inbound**: [`CurrencyApi`], implemented by the service
//! - **Outbound**: [`CurrencyGateway`], implemented by a transport adapter

pub mod inbound;
pub mod outbound;

pub use inbound::CurrencyApi;
pub use outbound::CurrencyGateway;
