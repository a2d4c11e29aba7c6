use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::{Response, StatusCode, Version};
use std::path::Path;

/// Body of a response produced by the file service
#[derive(Debug)]
pub enum Body {
    Empty,
    Full(Bytes),
    /// An open file streamed to the client in chunks
    File(tokio::fs::File),
}

/// A response ready to be written by the server
pub type FileResponse = Response<Body>;

/// Content type of HTML pages the server generates
const HTML: &str = "text/html; charset=utf-8";

/// Every connection carries a single exchange, so responses claim HTTP/1.0
fn new_response(status: StatusCode, body: Body) -> FileResponse {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.version_mut() = Version::HTTP_10;
    response
}

fn with_length(status: StatusCode, content_type: HeaderValue, len: u64, body: Body) -> FileResponse {
    let mut response = new_response(status, body);
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    response
}

/// `200 OK` streaming an opened file
pub fn file(path: &Path, file: tokio::fs::File, len: u64) -> FileResponse {
    with_length(StatusCode::OK, content_type_for(path), len, Body::File(file))
}

/// `200 OK` with a generated HTML page
pub fn html(page: String) -> FileResponse {
    let len = page.len() as u64;
    with_length(
        StatusCode::OK,
        HeaderValue::from_static(HTML),
        len,
        Body::Full(Bytes::from(page)),
    )
}

/// `301 Moved Permanently` pointing at `location`
///
/// Falls back to `400` if the location cannot be sent as a header.
pub fn redirect(location: &str) -> FileResponse {
    let Ok(value) = HeaderValue::from_bytes(location.as_bytes()) else {
        return error(StatusCode::BAD_REQUEST, "Bad request target");
    };
    let mut response = new_response(StatusCode::MOVED_PERMANENTLY, Body::Empty);
    let headers = response.headers_mut();
    headers.insert(header::LOCATION, value);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(0u64));
    response
}

/// An error page naming the status and a short message
pub fn error(status: StatusCode, message: &str) -> FileResponse {
    let page = format!(
        "<!DOCTYPE HTML>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>Error response</title>\n\
         </head>\n\
         <body>\n\
         <h1>Error response</h1>\n\
         <p>Error code: {}</p>\n\
         <p>Message: {}.</p>\n\
         </body>\n\
         </html>\n",
        status.as_u16(),
        crate::http::path::escape_html(message),
    );
    let len = page.len() as u64;
    with_length(status, HeaderValue::from_static(HTML), len, Body::Full(Bytes::from(page)))
}

/// Guesses a content type from the file extension
pub fn content_type_for(path: &Path) -> HeaderValue {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    HeaderValue::from_str(mime.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_guess() {
        assert_eq!(content_type_for(Path::new("index.html")), "text/html");
        assert_eq!(content_type_for(Path::new("data.json")), "application/json");
        assert_eq!(content_type_for(Path::new("blob")), "application/octet-stream");
        assert_eq!(content_type_for(Path::new("archive.unknownext")), "application/octet-stream");
    }

    #[test]
    fn test_error_page() {
        let response = error(StatusCode::NOT_FOUND, "File not found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], HTML);

        let Body::Full(body) = response.body() else {
            panic!("Expected an in-memory body");
        };
        let text = String::from_utf8_lossy(body);
        assert!(text.contains("Error code: 404"));
        assert!(text.contains("Message: File not found."));
        assert_eq!(response.headers()[header::CONTENT_LENGTH], body.len().to_string().as_str());
    }

    #[test]
    fn test_redirect() {
        let response = redirect("/docs/");
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/docs/");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "0");
    }

    #[test]
    fn test_responses_use_http_10() {
        assert_eq!(redirect("/docs/").version(), Version::HTTP_10);
        assert_eq!(html(String::new()).version(), Version::HTTP_10);
        assert_eq!(error(StatusCode::NOT_FOUND, "x").version(), Version::HTTP_10);
    }
}
