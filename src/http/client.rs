use crate::{DuoError, Result};
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};

/// Response read back by [`HttpFileClient`]
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchedResponse {
    /// The body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Minimal HTTP/1.0 client for the file server
///
/// Every request uses a fresh connection, matching the server closing the
/// connection after each response.
///
/// # Examples
///
/// ```no_run
/// use duosrv::http::HttpFileClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = HttpFileClient::new("127.0.0.1:8080".parse()?);
///     let response = client.get("/README.md").await?;
///     println!("{} ({} bytes)", response.status, response.body.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFileClient {
    addr: SocketAddr,
    timeout: Duration,
}

impl HttpFileClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            timeout: Duration::from_secs(5),
        }
    }

    /// Set how long a whole exchange may take
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends `GET path`
    pub async fn get(&self, path: &str) -> Result<FetchedResponse> {
        self.request(Method::GET, path).await
    }

    /// Sends `HEAD path`
    pub async fn head(&self, path: &str) -> Result<FetchedResponse> {
        self.request(Method::HEAD, path).await
    }

    /// Sends a bodiless request with the given method
    pub async fn request(&self, method: Method, path: &str) -> Result<FetchedResponse> {
        let request = format!("{method} {path} HTTP/1.0\r\nHost: {}\r\n\r\n", self.addr);
        self.send_raw(request.as_bytes()).await
    }

    /// Writes `request` verbatim and parses whatever comes back
    pub async fn send_raw(&self, request: &[u8]) -> Result<FetchedResponse> {
        let exchange = async {
            let mut stream = TcpStream::connect(self.addr).await?;
            stream.write_all(request).await?;
            stream.flush().await?;

            let mut raw = Vec::new();
            stream.read_to_end(&mut raw).await?;
            Ok::<_, std::io::Error>(raw)
        };

        let raw = timeout(self.timeout, exchange)
            .await
            .map_err(|_| DuoError::Timeout(format!("HTTP exchange with {}", self.addr)))??;

        parse_response(&raw)
    }
}

fn parse_response(raw: &[u8]) -> Result<FetchedResponse> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut response = httparse::Response::new(&mut headers);

    let head_len = match response.parse(raw) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => {
            return Err(DuoError::Protocol("Incomplete response head".to_string()));
        }
        Err(e) => return Err(DuoError::Protocol(format!("Failed to parse response: {e}"))),
    };

    let status = response
        .code
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| DuoError::Protocol("Invalid status code".to_string()))?;

    let mut header_map = HeaderMap::new();
    for header in response.headers.iter() {
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|e| DuoError::Protocol(e.to_string()))?;
        let value =
            HeaderValue::from_bytes(header.value).map_err(|e| DuoError::Protocol(e.to_string()))?;
        header_map.append(name, value);
    }

    Ok(FetchedResponse {
        status,
        headers: header_map,
        body: Bytes::copy_from_slice(&raw[head_len..]),
    })
}
