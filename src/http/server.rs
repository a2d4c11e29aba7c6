use super::codec::{CodecError, HttpCodec, RequestHead};
use super::config::HttpConfig;
use super::files::FileService;
use super::response::{self, Body, FileResponse};
use crate::common::Server;
use crate::{DuoError, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use http::Method;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, warn};

/// Chunk size used when streaming files to the client
const COPY_CHUNK: usize = 64 * 1024;

/// How long a rejected client gets to finish sending before the socket closes
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// HTTP server that serves the files below a root directory
///
/// Each accepted connection is handled on its own task, answers a single
/// request and is closed.
///
/// # Examples
///
/// ```no_run
/// use duosrv::http::{HttpConfig, HttpFileServer};
/// use duosrv::Server;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = HttpConfig::new("127.0.0.1:8080".parse()?, ".");
///     let server = HttpFileServer::bind(config).await?;
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct HttpFileServer {
    config: HttpConfig,
    service: Arc<FileService>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl HttpFileServer {
    /// Binds the TCP listener described by `config`
    ///
    /// Fails with [`DuoError::Config`] if the root is not a directory and with
    /// [`DuoError::Bind`] if the address cannot be bound.
    pub async fn bind(config: HttpConfig) -> Result<Self> {
        Self::bind_with_shutdown(config, CancellationToken::new()).await
    }

    /// Binds the listener and stops serving when `shutdown` is cancelled
    pub async fn bind_with_shutdown(config: HttpConfig, shutdown: CancellationToken) -> Result<Self> {
        let service = FileService::new(&config.root, &config.server_name)?;

        let bind_error = |source: std::io::Error| DuoError::Bind {
            protocol: "HTTP",
            addr: config.bind_addr,
            source,
        };
        let listener = TcpListener::bind(config.bind_addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        Ok(Self {
            config,
            service: Arc::new(service),
            listener,
            local_addr,
            shutdown,
        })
    }

    /// Reads one request head from the connection
    ///
    /// Returns `Ok(None)` if the client went away or stayed silent past the
    /// read timeout.
    async fn read_head(
        stream: &mut TcpStream,
        codec: &mut HttpCodec,
        buffer: &mut BytesMut,
        addr: SocketAddr,
        read_timeout: Duration,
    ) -> std::result::Result<Option<RequestHead>, CodecError> {
        loop {
            if let Some(head) = codec.decode(buffer)? {
                return Ok(Some(head));
            }

            match timeout(read_timeout, stream.read_buf(buffer)).await {
                Ok(Ok(0)) => {
                    info!(%addr, "Client closed connection");
                    return Ok(None);
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(CodecError::Io(e)),
                Err(_) => {
                    warn!(%addr, "Read timeout");
                    return Ok(None);
                }
            }
        }
    }

    /// Writes the response head and body, bounding each write by `write_timeout`
    async fn write_response(
        stream: &mut TcpStream,
        codec: &mut HttpCodec,
        response: FileResponse,
        write_timeout: Duration,
    ) -> Result<()> {
        let (parts, body) = response.into_parts();
        let mut head = BytesMut::new();
        codec.encode(parts, &mut head)?;

        write_with_timeout(stream, &head, write_timeout).await?;
        match body {
            Body::Empty => {}
            Body::Full(bytes) => write_with_timeout(stream, &bytes, write_timeout).await?,
            Body::File(mut file) => {
                let mut chunk = vec![0; COPY_CHUNK];
                loop {
                    let n = file.read(&mut chunk).await?;
                    if n == 0 {
                        break;
                    }
                    write_with_timeout(stream, &chunk[..n], write_timeout).await?;
                }
            }
        }

        stream.flush().await?;
        // The client may already have hung up
        let _ = stream.shutdown().await;
        Ok(())
    }

    /// Handles a single connection: one request, one response
    async fn handle_connection(
        mut stream: TcpStream,
        addr: SocketAddr,
        service: Arc<FileService>,
        config: HttpConfig,
    ) -> Result<()> {
        let mut codec = HttpCodec::new(config.max_request_size);
        let mut buffer = BytesMut::with_capacity(4096);

        let head = match Self::read_head(&mut stream, &mut codec, &mut buffer, addr, config.read_timeout).await {
            Ok(Some(head)) => head,
            Ok(None) => return Ok(()),
            Err(CodecError::Io(e)) => return Err(DuoError::Http(e)),
            Err(e) => {
                let status = e.status();
                warn!(%addr, status = status.as_u16(), error = %e, "Rejected malformed request");
                let response = response::error(status, &e.to_string());
                let result = Self::write_response(&mut stream, &mut codec, response, config.write_timeout).await;
                drain(&mut stream, config.max_request_size).await;
                return result;
            }
        };

        let response = service.respond(&head).await;
        let status = response.status();
        info!(
            %addr,
            method = %head.method,
            path = %head.target,
            status = status.as_u16(),
            "Served request"
        );

        let rejected = !matches!(head.method, Method::GET | Method::HEAD);
        let result = Self::write_response(&mut stream, &mut codec, response, config.write_timeout).await;
        if rejected {
            drain(&mut stream, config.max_request_size).await;
        }
        result
    }
}

/// Discards what the client is still sending, up to `limit` bytes
///
/// Closing a socket with unread input makes the kernel answer with a reset,
/// which can destroy the response before the client has read it.
async fn drain(stream: &mut TcpStream, limit: usize) {
    let discard = async {
        let mut chunk = vec![0; 4096];
        let mut drained = 0;
        while drained < limit {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => drained += n,
            }
        }
    };
    let _ = timeout(DRAIN_TIMEOUT, discard).await;
}

async fn write_with_timeout(stream: &mut TcpStream, data: &[u8], write_timeout: Duration) -> Result<()> {
    timeout(write_timeout, stream.write_all(data))
        .await
        .map_err(|_| DuoError::Timeout("Write to client timed out".to_string()))?
        .map_err(DuoError::Http)
}

#[async_trait]
impl Server for HttpFileServer {
    /// Accepts connections until the shutdown token is cancelled
    async fn run(&self) -> Result<()> {
        info!(
            address = %self.local_addr,
            root = %self.service.root().display(),
            "HTTP file server listening"
        );

        let connection_count = Arc::new(AtomicUsize::new(0));

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let current_count = connection_count.load(Ordering::SeqCst);
                            if current_count >= self.config.max_connections {
                                warn!(%addr, current = current_count, limit = self.config.max_connections, "Connection rejected: limit reached");
                                continue;
                            }

                            let new_count = connection_count.fetch_add(1, Ordering::SeqCst) + 1;
                            info!(%addr, current = new_count, "Accepted connection");

                            let service = self.service.clone();
                            let config = self.config.clone();
                            let connection_count = connection_count.clone();
                            let span = tracing::info_span!("connection", %addr);
                            tokio::spawn(async move {
                                if let Err(e) = Self::handle_connection(stream, addr, service, config).instrument(span).await {
                                    error!(%addr, error = %e, "Error handling connection");
                                }
                                let final_count = connection_count.fetch_sub(1, Ordering::SeqCst) - 1;
                                info!(%addr, current = final_count, "Connection closed");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = self.shutdown.cancelled() => {
                    info!("Received shutdown signal, stopping HTTP server");
                    break;
                }
            }
        }

        info!("HTTP file server stopped");
        Ok(())
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
