use super::config::UdpConfig;
use crate::common::Server;
use crate::{DuoError, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::{net::UdpSocket, time::timeout};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// UDP responder that answers every datagram with a fixed greeting
///
/// The payload of an inbound datagram is logged and otherwise ignored;
/// whatever it contains, the sender gets `config.greeting` back.
///
/// # Examples
///
/// ```no_run
/// use duosrv::udp::{UdpConfig, UdpGreetingServer};
/// use duosrv::Server;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = UdpConfig::new("127.0.0.1:8080".parse()?);
///     let server = UdpGreetingServer::bind(config).await?;
///     let shutdown = server.shutdown_token();
///
///     let handle = tokio::spawn(async move { server.run().await });
///
///     // Do other work...
///
///     shutdown.cancel();
///     handle.await??;
///     Ok(())
/// }
/// ```
pub struct UdpGreetingServer {
    config: UdpConfig,
    socket: UdpSocket,
    local_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl UdpGreetingServer {
    /// Binds the UDP socket described by `config`
    ///
    /// Failing to bind is reported as [`DuoError::Bind`].
    pub async fn bind(config: UdpConfig) -> Result<Self> {
        Self::bind_with_shutdown(config, CancellationToken::new()).await
    }

    /// Binds the socket and stops serving when `shutdown` is cancelled
    pub async fn bind_with_shutdown(config: UdpConfig, shutdown: CancellationToken) -> Result<Self> {
        let bind_error = |source: std::io::Error| DuoError::Bind {
            protocol: "UDP",
            addr: config.bind_addr,
            source,
        };
        let socket = UdpSocket::bind(config.bind_addr).await.map_err(bind_error)?;
        let local_addr = socket.local_addr().map_err(bind_error)?;

        Ok(Self {
            config,
            socket,
            local_addr,
            shutdown,
        })
    }

    /// Sends the greeting to a single sender
    async fn reply(&self, addr: SocketAddr) -> Result<usize> {
        timeout(
            self.config.write_timeout,
            self.socket.send_to(&self.config.greeting, addr),
        )
        .await
        .map_err(|_| DuoError::Timeout(format!("Sending greeting to {addr}")))?
        .map_err(DuoError::Udp)
    }
}

#[async_trait]
impl Server for UdpGreetingServer {
    /// Receives datagrams and answers each with the greeting
    async fn run(&self) -> Result<()> {
        info!(address = %self.local_addr, "UDP greeting server listening");

        let mut buffer = vec![0; self.config.buffer_size];

        loop {
            tokio::select! {
                res = self.socket.recv_from(&mut buffer) => {
                    match res {
                        Ok((n, addr)) => {
                            let preview = String::from_utf8_lossy(&buffer[..n]);
                            info!(%addr, size = n, preview = %preview, "Received datagram");

                            match self.reply(addr).await {
                                Ok(sent) => info!(%addr, size = sent, "Sent greeting"),
                                Err(DuoError::Timeout(msg)) => warn!(%addr, "{msg} timed out"),
                                Err(e) => error!(%addr, error = %e, "Failed to send greeting"),
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to receive datagram");
                        }
                    }
                }
                _ = self.shutdown.cancelled() => {
                    info!("Received shutdown signal, stopping UDP server");
                    break;
                }
            }
        }

        info!("UDP greeting server stopped");
        Ok(())
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
