use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the HTTP file server
///
/// # Examples
///
/// ```rust
/// use duosrv::http::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("127.0.0.1:8080".parse().unwrap(), "/srv/www")
///     .with_max_connections(50)
///     .with_read_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.max_connections, 50);
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Network address to bind to
    pub bind_addr: SocketAddr,
    /// Directory whose contents are served
    pub root: PathBuf,
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Largest request head (request line plus headers) accepted, in bytes
    pub max_request_size: usize,
    /// How long to wait for the client to send its request
    pub read_timeout: Duration,
    /// Upper bound on each write to the client
    pub write_timeout: Duration,
    /// Value of the `Server` response header
    pub server_name: String,
}

impl HttpConfig {
    /// Create a configuration serving `root` on `bind_addr`
    pub fn new(bind_addr: SocketAddr, root: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr,
            root: root.into(),
            max_connections: 100,
            max_request_size: 64 * 1024,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            server_name: format!("duosrv/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the maximum number of concurrent connections
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the largest accepted request head
    pub fn with_max_request_size(mut self, max_request_size: usize) -> Self {
        self.max_request_size = max_request_size;
        self
    }

    /// Set the read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the `Server` header value
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = server_name.into();
        self
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8080)), ".")
    }
}
