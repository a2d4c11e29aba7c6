use crate::{DuoError, Result};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::time::{Duration, timeout};

/// UDP client for talking to the greeting responder
///
/// # Examples
///
/// ```no_run
/// use duosrv::udp::UdpGreetingClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let addr = "127.0.0.1:8080".parse()?;
///     let client = UdpGreetingClient::connect(addr).await?;
///
///     let reply = client.send_string("ping").await?;
///     assert_eq!(reply, "Hello from server!");
///     Ok(())
/// }
/// ```
pub struct UdpGreetingClient {
    socket: UdpSocket,
    reply_timeout: Duration,
}

impl UdpGreetingClient {
    /// Binds an ephemeral local socket and connects it to `server_addr`
    pub async fn connect(server_addr: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if server_addr.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local).await.map_err(DuoError::Udp)?;
        socket.connect(server_addr).await.map_err(DuoError::Udp)?;

        Ok(Self {
            socket,
            reply_timeout: Duration::from_millis(500),
        })
    }

    /// Set how long to wait for a reply
    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    /// Sends one datagram and returns the reply payload
    pub async fn send(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.socket.send(data).await.map_err(DuoError::Udp)?;

        let mut buffer = vec![0; 1024];
        let n = timeout(self.reply_timeout, self.socket.recv(&mut buffer))
            .await
            .map_err(|_| DuoError::Timeout("Datagram receive timeout".to_string()))?
            .map_err(DuoError::Udp)?;

        buffer.truncate(n);
        Ok(buffer)
    }

    /// Sends a string and returns the reply as a string
    pub async fn send_string(&self, data: &str) -> Result<String> {
        let reply = self.send(data.as_bytes()).await?;
        String::from_utf8(reply).map_err(DuoError::Utf8)
    }
}
