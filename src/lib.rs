use crate::http::codec::CodecError;
use std::net::SocketAddr;
use thiserror::Error;

/// Error types for the duosrv library
#[derive(Error, Debug)]
pub enum DuoError {
    /// A listener could not bind its socket; fatal at startup
    #[error("Failed to bind {protocol} listener on {addr}: {source}")]
    Bind {
        protocol: &'static str,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// HTTP connection errors (accept, read, write)
    #[error("HTTP error: {0}")]
    Http(#[from] std::io::Error),

    /// UDP-related errors (send, receive)
    #[error("UDP error: {0}")]
    Udp(std::io::Error),

    /// Malformed or oversized HTTP request
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// UTF-8 encoding errors
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<CodecError> for DuoError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => DuoError::Http(e),
            other => DuoError::Protocol(other.to_string()),
        }
    }
}

/// Result type for the duosrv library
pub type Result<T> = std::result::Result<T, DuoError>;

pub mod app;
pub mod common;
pub mod http;
pub mod udp;

// Re-export main types for convenience
pub use app::{App, AppConfig};
pub use common::Server;
pub use crate::http::{HttpConfig, HttpFileClient, HttpFileServer};
pub use udp::{UdpConfig, UdpGreetingClient, UdpGreetingServer};
