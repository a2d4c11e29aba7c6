//! Static file service: turns a decoded request head into a response.

use super::codec::RequestHead;
use super::listing;
use super::path::RequestTarget;
use super::response::{self, Body, FileResponse};
use crate::{DuoError, Result};
use http::header::{self, HeaderValue};
use http::{Method, StatusCode};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files tried, in order, when a directory is requested
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Outcome of mapping a request path onto the served directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    Listing(PathBuf),
    Redirect(String),
    NotFound,
}

/// Serves files below a root directory
#[derive(Debug, Clone)]
pub struct FileService {
    root: PathBuf,
    server_header: HeaderValue,
}

impl FileService {
    /// Creates a service for `root`, which must be an existing directory
    pub fn new(root: &Path, server_name: &str) -> Result<Self> {
        let root = root
            .canonicalize()
            .map_err(|e| DuoError::Config(format!("Cannot serve {}: {e}", root.display())))?;
        if !root.is_dir() {
            return Err(DuoError::Config(format!(
                "Cannot serve {}: not a directory",
                root.display()
            )));
        }
        let server_header = HeaderValue::from_str(server_name)
            .map_err(|e| DuoError::Config(format!("Invalid server name {server_name:?}: {e}")))?;

        Ok(Self {
            root,
            server_header,
        })
    }

    /// The directory being served
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Builds the response for one request
    ///
    /// `GET` and `HEAD` are served; any other method gets `501`. `HEAD`
    /// answers carry the headers `GET` would send but no body.
    pub async fn respond(&self, head: &RequestHead) -> FileResponse {
        let mut response = match head.method {
            Method::GET | Method::HEAD => self.serve(&head.target).await,
            _ => response::error(
                StatusCode::NOT_IMPLEMENTED,
                &format!("Unsupported method ({})", head.method),
            ),
        };

        if head.method == Method::HEAD {
            *response.body_mut() = Body::Empty;
        }

        let headers = response.headers_mut();
        headers.insert(header::SERVER, self.server_header.clone());
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        response
    }

    /// Maps a request target onto the filesystem
    pub async fn resolve(&self, target: &RequestTarget) -> Resolved {
        let path = target.fs_path(&self.root);
        let Ok(metadata) = tokio::fs::metadata(&path).await else {
            return Resolved::NotFound;
        };

        if metadata.is_dir() {
            if !target.has_trailing_slash() {
                return Resolved::Redirect(target.with_trailing_slash());
            }
            for index in INDEX_FILES {
                let candidate = path.join(index);
                if is_file(&candidate).await {
                    return Resolved::File(candidate);
                }
            }
            return Resolved::Listing(path);
        }

        // FIFOs and devices would block the open indefinitely
        if !metadata.is_file() || target.has_trailing_slash() {
            return Resolved::NotFound;
        }
        Resolved::File(path)
    }

    async fn serve(&self, raw_target: &str) -> FileResponse {
        let target = RequestTarget::parse(raw_target);

        match self.resolve(&target).await {
            Resolved::File(path) => open(&path).await,
            Resolved::Listing(dir) => match listing::read_entries(&dir).await {
                Ok(entries) => response::html(listing::render(&target.display_path(), &entries)),
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "Cannot list directory");
                    response::error(StatusCode::NOT_FOUND, "No permission to list directory")
                }
            },
            Resolved::Redirect(location) => response::redirect(&location),
            Resolved::NotFound => response::error(StatusCode::NOT_FOUND, "File not found"),
        }
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn open(path: &Path) -> FileResponse {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Cannot open file");
            return response::error(StatusCode::NOT_FOUND, "File not found");
        }
    };
    match file.metadata().await {
        Ok(metadata) if metadata.is_file() => response::file(path, file, metadata.len()),
        _ => response::error(StatusCode::NOT_FOUND, "File not found"),
    }
}
