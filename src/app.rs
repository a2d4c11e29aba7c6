//! Composition root owning both listeners
//!
//! [`App`] binds the HTTP file server and the UDP greeting responder up
//! front, so a bind failure stops startup before anything serves. While
//! running, the HTTP loop lives on a spawned task and the UDP loop on the
//! caller's task; one cancellation token stops both.

use crate::common::Server;
use crate::{DuoError, HttpConfig, HttpFileServer, Result, UdpConfig, UdpGreetingServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Configuration for both listeners
///
/// # Examples
///
/// ```
/// use duosrv::AppConfig;
///
/// let config = AppConfig::new("0.0.0.0:8080".parse().unwrap(), "/srv/www");
/// assert_eq!(config.http.bind_addr, config.udp.bind_addr);
/// ```
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub udp: UdpConfig,
    /// Stop both listeners on Ctrl-C
    pub handle_ctrl_c: bool,
}

impl AppConfig {
    /// Both listeners on the same address and port, serving `root` over HTTP
    pub fn new(bind_addr: SocketAddr, root: impl Into<PathBuf>) -> Self {
        Self {
            http: HttpConfig::new(bind_addr, root),
            udp: UdpConfig::new(bind_addr),
            handle_ctrl_c: true,
        }
    }

    /// Set whether Ctrl-C triggers shutdown
    pub fn with_ctrl_c(mut self, handle_ctrl_c: bool) -> Self {
        self.handle_ctrl_c = handle_ctrl_c;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8080)), ".")
    }
}

/// Both listeners, bound and ready to serve
pub struct App {
    http: HttpFileServer,
    udp: UdpGreetingServer,
    shutdown: CancellationToken,
    handle_ctrl_c: bool,
}

impl App {
    /// Binds the HTTP listener, then the UDP one
    ///
    /// Either failure is returned immediately; a listener bound before the
    /// failure is dropped and its socket closed.
    pub async fn bind(config: AppConfig) -> Result<Self> {
        let shutdown = CancellationToken::new();
        let http = HttpFileServer::bind_with_shutdown(config.http, shutdown.child_token()).await?;
        let udp = UdpGreetingServer::bind_with_shutdown(config.udp, shutdown.child_token()).await?;

        Ok(Self {
            http,
            udp,
            shutdown,
            handle_ctrl_c: config.handle_ctrl_c,
        })
    }

    /// Address of the HTTP listener
    pub fn http_addr(&self) -> SocketAddr {
        self.http.local_addr()
    }

    /// Address of the UDP listener
    pub fn udp_addr(&self) -> SocketAddr {
        self.udp.local_addr()
    }

    /// Token that stops both listeners when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serves until shutdown
    ///
    /// Returns the UDP loop's error if it failed, otherwise the HTTP loop's.
    pub async fn run(self) -> Result<()> {
        let App {
            http,
            udp,
            shutdown,
            handle_ctrl_c,
        } = self;

        if handle_ctrl_c {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                tokio::select! {
                    res = signal::ctrl_c() => {
                        match res {
                            Ok(()) => info!("Received Ctrl-C, shutting down"),
                            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
                        }
                        shutdown.cancel();
                    }
                    _ = shutdown.cancelled() => {}
                }
            });
        }

        let http_task = tokio::spawn(async move { http.run().await });

        let udp_result = udp.run().await;
        // A failed UDP loop must not leave the HTTP loop running
        shutdown.cancel();

        let http_result = http_task
            .await
            .map_err(|e| DuoError::Config(format!("HTTP server task failed: {e}")))?;

        udp_result.and(http_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn loopback_config(root: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::new(SocketAddr::from(([127, 0, 0, 1], 0)), root).with_ctrl_c(false);
        config.http.read_timeout = Duration::from_secs(2);
        config
    }

    #[test]
    fn test_default_config_shares_address() {
        let config = AppConfig::default();
        assert_eq!(config.http.bind_addr, config.udp.bind_addr);
        assert_eq!(config.http.bind_addr.port(), 8080);
        assert!(config.handle_ctrl_c);
    }

    #[tokio::test]
    async fn test_bind_reports_both_addresses() {
        let dir = tempdir().unwrap();
        let app = App::bind(loopback_config(dir.path())).await.unwrap();

        assert_ne!(app.http_addr().port(), 0);
        assert_ne!(app.udp_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_cancel_stops_both_loops() {
        let dir = tempdir().unwrap();
        let app = App::bind(loopback_config(dir.path())).await.unwrap();
        let shutdown = app.shutdown_token();
        let handle = tokio::spawn(app.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();

        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }

    #[tokio::test]
    async fn test_bind_fails_on_bad_root() {
        let dir = tempdir().unwrap();
        let result = App::bind(loopback_config(&dir.path().join("absent"))).await;
        assert!(matches!(result, Err(DuoError::Config(_))));
    }
}
