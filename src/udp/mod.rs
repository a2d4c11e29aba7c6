//! UDP greeting responder
//!
//! Every inbound datagram is logged and answered with a constant greeting.

pub mod client;
pub mod config;
pub mod server;

#[cfg(test)]
mod tests;

pub use client::UdpGreetingClient;
pub use config::{DEFAULT_GREETING, MAX_DATAGRAM_SIZE, UdpConfig};
pub use server::UdpGreetingServer;
