//! Middleware for the HTTP layer.

pub mod cors;

pub use cors::create_cors_layer;
