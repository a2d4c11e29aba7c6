//! Common traits and helpers used across the duosrv library
//!
//! This module contains the trait shared by both listeners and the
//! helpers integration tests and benchmarks use to start them.

pub mod test_utils;
pub mod traits;

pub use test_utils::{SpawnedServer, spawn_http_server, spawn_udp_server};
pub use traits::Server;
