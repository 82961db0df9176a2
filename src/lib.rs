//! Drive - a folder/file hierarchy service.
//!
//! Folders and file records are kept in SQLite, file contents in a sharded
//! blob directory, and everything is served over a JSON HTTP API.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{DriveError, Result};
pub use file::{FileStorage, HierarchyService};
