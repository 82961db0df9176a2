//! Cycle guard for folder moves.

use sqlx::SqliteConnection;
use tracing::debug;

use super::folder::FolderRepository;
use crate::{DriveError, Result};

/// Message carried by the validation error for rejected moves.
pub const CIRCULAR_REFERENCE: &str = "circular reference";

/// Check that placing `node_id` under `proposed_parent_id` keeps the folders a forest.
///
/// Walks from the proposed parent up to a root. Reaching `node_id` on the way
/// (or proposing the node as its own parent) is rejected. The walk is bounded
/// by the folder count; running past it means the stored graph already holds a
/// cycle, which is a storage fault rather than a bad request.
pub async fn ensure_acyclic(
    conn: &mut SqliteConnection,
    node_id: i64,
    proposed_parent_id: i64,
) -> Result<()> {
    if proposed_parent_id == node_id {
        debug!(node_id, "Rejected move: folder as its own parent");
        return Err(DriveError::Validation(CIRCULAR_REFERENCE.to_string()));
    }

    let max_steps = FolderRepository::count(conn).await?;
    let mut current = Some(proposed_parent_id);
    let mut steps = 0i64;

    while let Some(folder_id) = current {
        if folder_id == node_id {
            debug!(node_id, proposed_parent_id, "Rejected move: target is a descendant");
            return Err(DriveError::Validation(CIRCULAR_REFERENCE.to_string()));
        }

        steps += 1;
        if steps > max_steps {
            return Err(DriveError::Storage(format!(
                "ancestor chain of folder {proposed_parent_id} does not reach a root"
            )));
        }

        current = match FolderRepository::parent_of(conn, folder_id).await? {
            Some(parent) => parent,
            None => {
                return Err(DriveError::NotFound(format!("folder {folder_id}")));
            }
        };
    }

    Ok(())
}
