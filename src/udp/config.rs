use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;

/// Reply sent to every datagram the responder receives
pub const DEFAULT_GREETING: &[u8] = b"Hello from server!";

/// Largest payload a UDP datagram can carry over IPv4
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Configuration for the UDP greeting responder
///
/// # Examples
///
/// ```
/// use duosrv::udp::UdpConfig;
/// use std::time::Duration;
///
/// let config = UdpConfig::new("127.0.0.1:8080".parse().unwrap())
///     .with_buffer_size(2048)
///     .with_write_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.greeting.as_ref(), b"Hello from server!");
/// ```
#[derive(Debug, Clone)]
pub struct UdpConfig {
    /// Address to bind the responder to
    pub bind_addr: SocketAddr,
    /// Receive buffer size; longer datagrams are truncated before logging
    pub buffer_size: usize,
    /// Upper bound on a single reply send
    pub write_timeout: Duration,
    /// Bytes sent back to every sender
    pub greeting: Bytes,
}

impl UdpConfig {
    /// Create a new configuration bound to the given address
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            buffer_size: MAX_DATAGRAM_SIZE,
            write_timeout: Duration::from_secs(5),
            greeting: Bytes::from_static(DEFAULT_GREETING),
        }
    }

    /// Set the receive buffer size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set the reply send timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Replace the reply payload
    pub fn with_greeting(mut self, greeting: impl Into<Bytes>) -> Self {
        self.greeting = greeting.into();
        self
    }
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 0)))
    }
}
