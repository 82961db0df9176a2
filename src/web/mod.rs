//! HTTP API for folders and files.
//!
//! JSON endpoints under `/api`, plus multipart upload and raw download.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
