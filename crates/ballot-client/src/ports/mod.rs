//! # Ports Layer
//!
//! Inbound ports (terminal API) and outbound ports (transport, storage,
//! clock, view).

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
