use bytes::{Buf, BufMut, BytesMut};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode, Version, response};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Most headers a request may carry
const MAX_HEADERS: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP parsing error: {0}")]
    HttpParse(String),
    #[error("Request head exceeds {0} bytes")]
    TooLarge(usize),
}

impl CodecError {
    /// Status the server answers with when decoding fails this way
    pub fn status(&self) -> StatusCode {
        match self {
            CodecError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CodecError::HttpParse(_) => StatusCode::BAD_REQUEST,
            CodecError::TooLarge(_) => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
        }
    }
}

/// Request line and headers of an HTTP/1.x request
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    /// Request target exactly as sent, still percent-encoded
    pub target: String,
    pub version: Version,
    pub headers: HeaderMap,
}

/// Decodes request heads and encodes response heads
///
/// Request bodies are never read: the server only answers `GET` and `HEAD`,
/// and closes the connection after one response.
#[derive(Debug, Clone)]
pub struct HttpCodec {
    max_head_size: usize,
}

impl HttpCodec {
    pub fn new(max_head_size: usize) -> Self {
        Self { max_head_size }
    }
}

impl Decoder for HttpCodec {
    type Item = RequestHead;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RequestHead>, CodecError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut headers);

        let parsed_len = match req.parse(src) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) => {
                if src.len() > self.max_head_size {
                    return Err(CodecError::TooLarge(self.max_head_size));
                }
                return Ok(None);
            }
            Err(httparse::Error::TooManyHeaders) => {
                return Err(CodecError::TooLarge(self.max_head_size));
            }
            Err(e) => {
                return Err(CodecError::HttpParse(format!("Failed to parse request head: {e}")));
            }
        };

        if parsed_len > self.max_head_size {
            return Err(CodecError::TooLarge(self.max_head_size));
        }

        let method = req
            .method
            .and_then(|m| Method::from_bytes(m.as_bytes()).ok())
            .ok_or_else(|| CodecError::HttpParse("Invalid method".to_string()))?;
        let target = req
            .path
            .ok_or_else(|| CodecError::HttpParse("Missing request target".to_string()))?
            .to_string();
        let version = match req.version {
            Some(0) => Version::HTTP_10,
            _ => Version::HTTP_11,
        };

        let mut header_map = HeaderMap::with_capacity(req.headers.len());
        for header in req.headers.iter() {
            let name = HeaderName::from_bytes(header.name.as_bytes())
                .map_err(|e| CodecError::HttpParse(format!("Invalid header name: {e}")))?;
            let value = HeaderValue::from_bytes(header.value)
                .map_err(|e| CodecError::HttpParse(format!("Invalid header value: {e}")))?;
            header_map.append(name, value);
        }

        src.advance(parsed_len);

        Ok(Some(RequestHead {
            method,
            target,
            version,
            headers: header_map,
        }))
    }
}

impl Encoder<response::Parts> for HttpCodec {
    type Error = CodecError;

    fn encode(&mut self, head: response::Parts, dst: &mut BytesMut) -> Result<(), CodecError> {
        let reason = head.status.canonical_reason().unwrap_or("Unknown");
        let status_line = format!("{:?} {} {}\r\n", head.version, head.status.as_u16(), reason);
        dst.put_slice(status_line.as_bytes());

        for (name, value) in head.headers.iter() {
            dst.put_slice(name.as_str().as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Response;

    #[test]
    fn test_decode_complete_head() {
        let mut codec = HttpCodec::new(1024);
        let mut buf = BytesMut::from(&b"GET /docs/a%20b.txt?x=1 HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\n"[..]);

        let head = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(head.method, Method::GET);
        assert_eq!(head.target, "/docs/a%20b.txt?x=1");
        assert_eq!(head.version, Version::HTTP_11);
        assert_eq!(head.headers["host"], "localhost");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_http10() {
        let mut codec = HttpCodec::new(1024);
        let mut buf = BytesMut::from(&b"HEAD / HTTP/1.0\r\n\r\n"[..]);

        let head = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(head.method, Method::HEAD);
        assert_eq!(head.version, Version::HTTP_10);
    }

    #[test]
    fn test_decode_partial_waits_for_more() {
        let mut codec = HttpCodec::new(1024);
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: loc"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"alhost\r\n\r\n");
        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_decode_leaves_trailing_bytes() {
        let mut codec = HttpCodec::new(1024);
        let mut buf = BytesMut::from(&b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello"[..]);

        let head = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(head.method, Method::POST);
        assert_eq!(&buf[..], b"hello");
    }

    #[test]
    fn test_decode_rejects_oversized_head() {
        let mut codec = HttpCodec::new(32);
        let mut buf = BytesMut::from(&b"GET /a-very-long-path-that-keeps-going HTTP/1.1\r\nHost"[..]);

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, CodecError::TooLarge(32)));
        assert_eq!(err.status(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let mut codec = HttpCodec::new(1024);
        let mut buf = BytesMut::from(&b"\x01\x02 nonsense\r\n\r\n"[..]);

        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_encode_response_head() {
        let mut codec = HttpCodec::new(1024);
        let response = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("content-length", "0")
            .body(())
            .unwrap();
        let (parts, ()) = response.into_parts();

        let mut out = BytesMut::new();
        codec.encode(parts, &mut out).unwrap();
        assert_eq!(&out[..], b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n");
    }
}
