//! Data transfer objects for the HTTP layer.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
