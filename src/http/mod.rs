//! HTTP static file server
//!
//! Serves the files below a root directory with the semantics of a plain
//! static file handler: `GET` and `HEAD`, directory listings, index pages,
//! and a redirect for directory URLs missing their trailing slash.

pub mod client;
pub mod codec;
pub mod config;
pub mod files;
pub mod listing;
pub mod path;
pub mod response;
pub mod server;


pub use client::{FetchedResponse, HttpFileClient};
pub use codec::{HttpCodec, RequestHead};
pub use config::HttpConfig;
pub use files::{FileService, Resolved};
pub use server::HttpFileServer;
