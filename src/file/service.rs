//! Hierarchy service.
//!
//! Every mutation takes the database's writer lock and runs its checks and
//! writes in one transaction, so a conflict check never races another write.
//! Reads go straight to the pool.

use tracing::{debug, info};

use crate::db::Database;
use crate::{DriveError, Result};

use super::cascade::{cascade_delete, DeleteSummary};
use super::folder::{Folder, FolderKey, FolderRepository, FolderScope, FolderUpdate, NewFolder};
use super::guard::ensure_acyclic;
use super::metadata::{FileFilter, FileKey, FileRecord, FileRepository, NewFile};
use super::naming::{ensure_unique, validate_name};
use super::path;
use super::tree::{build_tree, TreeNode};

/// Media type recorded when the client supplies none.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Folder and file operations over a [`Database`].
#[derive(Debug, Clone, Copy)]
pub struct HierarchyService<'a> {
    db: &'a Database,
}

impl<'a> HierarchyService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a folder under an optional parent.
    pub async fn create_folder(&self, folder: &NewFolder) -> Result<Folder> {
        let name = validate_name(&folder.name)?;

        let mut tx = self.db.begin_write().await?;
        if let Some(parent_id) = folder.parent_id {
            if !FolderRepository::exists(&mut tx, parent_id).await? {
                return Err(DriveError::NotFound(format!("parent folder {parent_id}")));
            }
        }
        ensure_unique(&mut tx, &name, folder.parent_id, None).await?;

        let created = FolderRepository::create(
            &mut tx,
            &NewFolder {
                name,
                parent_id: folder.parent_id,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            folder_id = created.id,
            parent_id = ?created.parent_id,
            "Created folder '{}'",
            created.name
        );
        Ok(created)
    }

    /// Rename a folder, move it, or both.
    ///
    /// Fields left unset in `update` keep their current value.
    pub async fn rename_or_move(&self, id: i64, update: &FolderUpdate) -> Result<Folder> {
        let new_name = update.name.as_deref().map(validate_name).transpose()?;

        let mut tx = self.db.begin_write().await?;
        let current = FolderRepository::get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| DriveError::NotFound(format!("folder {id}")))?;

        let parent_id = match update.parent_id {
            Some(Some(parent_id)) => {
                if !FolderRepository::exists(&mut tx, parent_id).await? {
                    return Err(DriveError::NotFound(format!("parent folder {parent_id}")));
                }
                ensure_acyclic(&mut tx, id, parent_id).await?;
                Some(parent_id)
            }
            Some(None) => None,
            None => current.parent_id,
        };
        let name = new_name.unwrap_or(current.name);

        ensure_unique(&mut tx, &name, parent_id, Some(id)).await?;

        let updated = FolderRepository::update(&mut tx, id, &name, parent_id)
            .await?
            .ok_or_else(|| DriveError::NotFound(format!("folder {id}")))?;
        tx.commit().await?;

        info!(
            folder_id = id,
            parent_id = ?updated.parent_id,
            "Updated folder '{}'",
            updated.name
        );
        Ok(updated)
    }

    /// Delete a folder.
    ///
    /// Without `force`, only an empty folder may go. With `force`, the whole
    /// subtree and its files are removed.
    pub async fn delete_folder(&self, key: &FolderKey, force: bool) -> Result<DeleteSummary> {
        let mut tx = self.db.begin_write().await?;
        let folder = FolderRepository::find(&mut tx, key)
            .await?
            .ok_or_else(|| DriveError::NotFound(describe_folder_key(key)))?;

        let summary = if force {
            cascade_delete(&mut tx, folder.id).await?
        } else {
            let children = FolderRepository::count_children(&mut tx, folder.id).await?;
            let files = FolderRepository::count_files(&mut tx, folder.id).await?;
            if children > 0 || files > 0 {
                debug!(
                    folder_id = folder.id,
                    children, files, "Rejected delete of non-empty folder"
                );
                return Err(DriveError::Conflict(format!(
                    "folder '{}' is not empty; delete with force to remove its contents",
                    folder.name
                )));
            }
            FolderRepository::delete(&mut tx, folder.id).await?;
            DeleteSummary {
                folders_removed: 1,
                ..DeleteSummary::default()
            }
        };
        tx.commit().await?;

        info!(
            folder_id = folder.id,
            force,
            folders = summary.folders_removed,
            files = summary.files_removed,
            "Deleted folder '{}'",
            folder.name
        );
        Ok(summary)
    }

    /// Look up one folder by ID or name.
    pub async fn get_folder(&self, key: &FolderKey) -> Result<Folder> {
        let mut conn = self.db.pool().acquire().await?;
        FolderRepository::find(&mut conn, key)
            .await?
            .ok_or_else(|| DriveError::NotFound(describe_folder_key(key)))
    }

    /// List folders in a scope, ordered by name then ID.
    pub async fn list_folders(&self, scope: FolderScope) -> Result<Vec<Folder>> {
        let mut conn = self.db.pool().acquire().await?;
        FolderRepository::list(&mut conn, scope).await
    }

    /// Chain of folders from a root down to `id`.
    pub async fn folder_path(&self, id: i64) -> Result<Vec<Folder>> {
        let mut conn = self.db.pool().acquire().await?;
        let chain = FolderRepository::path(&mut conn, id).await?;
        if chain.is_empty() {
            return Err(DriveError::NotFound(format!("folder {id}")));
        }
        Ok(chain)
    }

    /// Record a file's metadata.
    ///
    /// The virtual path is stored in canonical form and must be unique within
    /// its folder scope.
    pub async fn create_file(&self, file: &NewFile) -> Result<FileRecord> {
        let original_name = path::validate(&file.original_name)?;
        let stored_name = file.stored_name.trim();
        if stored_name.is_empty() {
            return Err(DriveError::Validation("stored name is required".to_string()));
        }
        if file.size < 0 {
            return Err(DriveError::Validation(format!(
                "file size must not be negative, got {}",
                file.size
            )));
        }
        let mime_type = match file.mime_type.trim() {
            "" => DEFAULT_MIME_TYPE.to_string(),
            mime => mime.to_string(),
        };

        let mut tx = self.db.begin_write().await?;
        if let Some(folder_id) = file.folder_id {
            if !FolderRepository::exists(&mut tx, folder_id).await? {
                return Err(DriveError::NotFound(format!("folder {folder_id}")));
            }
        }
        if FileRepository::path_taken(&mut tx, file.folder_id, &original_name).await? {
            debug!(folder_id = ?file.folder_id, "Rejected duplicate path '{}'", original_name);
            return Err(DriveError::Conflict(format!(
                "a file named '{original_name}' already exists in this folder"
            )));
        }

        let created = FileRepository::create(
            &mut tx,
            &NewFile {
                folder_id: file.folder_id,
                original_name,
                stored_name: stored_name.to_string(),
                size: file.size,
                mime_type,
                owner_id: file.owner_id,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            file_id = created.id,
            folder_id = ?created.folder_id,
            size = created.size,
            "Created file '{}'",
            created.original_name
        );
        Ok(created)
    }

    /// Look up one file by ID or name.
    pub async fn get_file(&self, key: &FileKey) -> Result<FileRecord> {
        let mut conn = self.db.pool().acquire().await?;
        FileRepository::find(&mut conn, key)
            .await?
            .ok_or_else(|| DriveError::NotFound(describe_file_key(key)))
    }

    /// Delete a file's metadata and return the removed row.
    ///
    /// The blob is not touched; callers release it using `stored_name`.
    pub async fn delete_file(&self, key: &FileKey) -> Result<FileRecord> {
        let mut tx = self.db.begin_write().await?;
        let file = FileRepository::find(&mut tx, key)
            .await?
            .ok_or_else(|| DriveError::NotFound(describe_file_key(key)))?;

        if !FileRepository::delete(&mut tx, file.id).await? {
            return Err(DriveError::NotFound(describe_file_key(key)));
        }
        tx.commit().await?;

        info!(file_id = file.id, "Deleted file '{}'", file.original_name);
        Ok(file)
    }

    /// List files matching a filter, ordered by ID.
    pub async fn list_files(&self, filter: &FileFilter) -> Result<Vec<FileRecord>> {
        let mut conn = self.db.pool().acquire().await?;
        FileRepository::list(&mut conn, filter).await
    }

    /// Tree view of the files matching a filter.
    pub async fn file_tree(&self, filter: &FileFilter) -> Result<TreeNode> {
        let files = self.list_files(filter).await?;
        Ok(build_tree(&files))
    }
}

fn describe_folder_key(key: &FolderKey) -> String {
    match key {
        FolderKey::Id(id) => format!("folder {id}"),
        FolderKey::Name(name) => format!("folder '{name}'"),
    }
}

fn describe_file_key(key: &FileKey) -> String {
    match key {
        FileKey::Id(id) => format!("file {id}"),
        FileKey::Name(name) => format!("file '{name}'"),
    }
}
