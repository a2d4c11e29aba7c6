use crate::Result;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

/// Common trait for the listeners in this crate
///
/// Both the HTTP file server and the UDP greeting responder implement this
/// trait. A server is bound when it is constructed, so `run` only drives the
/// serving loop until the shutdown token is cancelled.
#[async_trait]
pub trait Server {
    /// Serves until the shutdown token is cancelled
    async fn run(&self) -> Result<()>;

    /// Returns the address the server is actually bound to
    fn local_addr(&self) -> SocketAddr;

    /// Returns the token that stops the serving loop when cancelled
    fn shutdown_token(&self) -> CancellationToken;
}
