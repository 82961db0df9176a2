//! HTTP handlers.

pub mod file;
pub mod folder;

pub use file::*;
pub use folder::*;

use std::sync::Arc;

use crate::file::{FileStorage, HierarchyService};
use crate::Database;

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: SharedDatabase,
    pub storage: FileStorage,
    /// Largest accepted upload, in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    pub fn new(db: SharedDatabase, storage: FileStorage, max_upload_size: u64) -> Self {
        Self {
            db,
            storage,
            max_upload_size,
        }
    }

    /// Hierarchy operations over the shared database.
    pub fn hierarchy(&self) -> HierarchyService<'_> {
        HierarchyService::new(&self.db)
    }
}
