//! HTTP API.
//!
//! Exposes disease prediction, crop analysis, soil-based recommendation,
//! and PDF reports as JSON/multipart endpoints. The router is composable:
//! `api_router()` returns a `Router` that can be mounted on any axum server.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server_on, ApiServer, ApiSession};
pub use types::ApiContext;
