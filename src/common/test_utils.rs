use crate::common::Server;
use crate::{HttpConfig, HttpFileServer, Result, UdpConfig, UdpGreetingServer};
use std::net::SocketAddr;
use std::path::Path;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A server running on a background task, as returned by the spawn helpers
pub struct SpawnedServer {
    pub handle: JoinHandle<Result<()>>,
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
}

impl SpawnedServer {
    /// Cancels the server and waits for its loop to return
    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();
        self.handle
            .await
            .map_err(|e| crate::DuoError::Config(format!("Server task failed: {e}")))?
    }
}

/// Starts an HTTP file server on an ephemeral loopback port serving `root`
pub async fn spawn_http_server(root: impl AsRef<Path>) -> Result<SpawnedServer> {
    let config = HttpConfig::new(SocketAddr::from(([127, 0, 0, 1], 0)), root.as_ref());
    let server = HttpFileServer::bind(config).await?;
    let addr = server.local_addr();
    let shutdown = server.shutdown_token();
    let handle = tokio::spawn(async move { server.run().await });

    Ok(SpawnedServer {
        handle,
        addr,
        shutdown,
    })
}

/// Starts a UDP greeting responder on an ephemeral loopback port
pub async fn spawn_udp_server() -> Result<SpawnedServer> {
    let config = UdpConfig::new(SocketAddr::from(([127, 0, 0, 1], 0)));
    let server = UdpGreetingServer::bind(config).await?;
    let addr = server.local_addr();
    let shutdown = server.shutdown_token();
    let handle = tokio::spawn(async move { server.run().await });

    Ok(SpawnedServer {
        handle,
        addr,
        shutdown,
    })
}
