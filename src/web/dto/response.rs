//! Response DTOs for the HTTP layer.

use serde::Serialize;

use crate::file::DeleteSummary;

/// Envelope for successful responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Result of a folder deletion.
#[derive(Debug, Serialize)]
pub struct FolderDeleteResponse {
    pub folders_removed: u64,
    pub files_removed: u64,
}

impl From<&DeleteSummary> for FolderDeleteResponse {
    fn from(summary: &DeleteSummary) -> Self {
        Self {
            folders_removed: summary.folders_removed,
            files_removed: summary.files_removed,
        }
    }
}

/// Health check payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
