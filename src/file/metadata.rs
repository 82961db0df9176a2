//! File record types and repository.

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::path;
use crate::{DriveError, Result};

/// Metadata for a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Folder this file belongs to (None for root level).
    pub folder_id: Option<i64>,
    /// Display name; also the virtual path used by the tree view.
    pub original_name: String,
    /// Opaque blob locator.
    pub stored_name: String,
    /// Size in bytes.
    pub size: i64,
    /// Media type.
    pub mime_type: String,
    /// Owning user, if recorded.
    pub owner_id: Option<i64>,
    /// When the file was uploaded (UTC, `YYYY-MM-DD HH:MM:SS`).
    pub uploaded_at: String,
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Folder this file belongs to.
    pub folder_id: Option<i64>,
    /// Display name / virtual path.
    pub original_name: String,
    /// Blob locator.
    pub stored_name: String,
    /// Size in bytes.
    pub size: i64,
    /// Media type.
    pub mime_type: String,
    /// Owning user.
    pub owner_id: Option<i64>,
}

impl NewFile {
    /// Create a root-level NewFile without an owner.
    pub fn new(
        original_name: impl Into<String>,
        stored_name: impl Into<String>,
        size: i64,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            folder_id: None,
            original_name: original_name.into(),
            stored_name: stored_name.into(),
            size,
            mime_type: mime_type.into(),
            owner_id: None,
        }
    }

    /// Place the file in a folder.
    pub fn in_folder(mut self, folder_id: i64) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    /// Set the owner.
    pub fn with_owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}

/// How a single file is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKey {
    /// By ID.
    Id(i64),
    /// By original name; the lowest ID wins when several files share it.
    Name(String),
}

/// Folder placement filter for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderFilter {
    /// Files at root level (no folder).
    Root,
    /// Files placed directly in a folder.
    In(i64),
}

/// Filter for file listings. Unset fields do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    /// Folder placement.
    pub folder: Option<FolderFilter>,
    /// Owner.
    pub owner_id: Option<i64>,
    /// Virtual-path prefix (matched literally, case-sensitive).
    pub path_prefix: Option<String>,
}

impl FileFilter {
    /// Create an empty filter (all files).
    pub fn new() -> Self {
        Self::default()
    }

    /// Only files directly in the given folder.
    pub fn in_folder(mut self, folder_id: i64) -> Self {
        self.folder = Some(FolderFilter::In(folder_id));
        self
    }

    /// Only root-level files.
    pub fn at_root(mut self) -> Self {
        self.folder = Some(FolderFilter::Root);
        self
    }

    /// Only files owned by the given user.
    pub fn owned_by(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Only files whose virtual path starts with `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }
}

const FILE_COLUMNS: &str =
    "id, folder_id, original_name, stored_name, size, mime_type, owner_id, uploaded_at";

/// Repository for file rows.
pub struct FileRepository;

impl FileRepository {
    /// Insert a file record and return the stored row.
    pub async fn create(conn: &mut SqliteConnection, file: &NewFile) -> Result<FileRecord> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO files (folder_id, original_name, stored_name, size, mime_type, owner_id)
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(file.folder_id)
        .bind(&file.original_name)
        .bind(&file.stored_name)
        .bind(file.size)
        .bind(&file.mime_type)
        .bind(file.owner_id)
        .fetch_one(&mut *conn)
        .await?;

        Self::get_by_id(conn, id)
            .await?
            .ok_or_else(|| DriveError::NotFound("file".to_string()))
    }

    /// Get a file by ID.
    pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(file)
    }

    /// Get the lowest-ID file with the given original name.
    pub async fn get_by_name(
        conn: &mut SqliteConnection,
        original_name: &str,
    ) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE original_name = ? ORDER BY id LIMIT 1"
        ))
        .bind(original_name)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(file)
    }

    /// Resolve a [`FileKey`].
    pub async fn find(conn: &mut SqliteConnection, key: &FileKey) -> Result<Option<FileRecord>> {
        match key {
            FileKey::Id(id) => Self::get_by_id(conn, *id).await,
            FileKey::Name(name) => Self::get_by_name(conn, &path::normalize(name)).await,
        }
    }

    /// Whether a file with this virtual path exists in the folder scope.
    pub async fn path_taken(
        conn: &mut SqliteConnection,
        folder_id: Option<i64>,
        original_name: &str,
    ) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM files WHERE folder_id IS ? AND original_name = ?)",
        )
        .bind(folder_id)
        .bind(original_name)
        .fetch_one(&mut *conn)
        .await?;

        Ok(taken)
    }

    /// List files matching a filter, ordered by ID.
    pub async fn list(conn: &mut SqliteConnection, filter: &FileFilter) -> Result<Vec<FileRecord>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {FILE_COLUMNS} FROM files WHERE 1 = 1"));

        match filter.folder {
            Some(FolderFilter::Root) => {
                query.push(" AND folder_id IS NULL");
            }
            Some(FolderFilter::In(folder_id)) => {
                query.push(" AND folder_id = ");
                query.push_bind(folder_id);
            }
            None => {}
        }

        if let Some(owner_id) = filter.owner_id {
            query.push(" AND owner_id = ");
            query.push_bind(owner_id);
        }

        if let Some(ref prefix) = filter.path_prefix {
            // substr comparison keeps % and _ in names literal
            query.push(" AND substr(original_name, 1, length(");
            query.push_bind(prefix.clone());
            query.push(")) = ");
            query.push_bind(prefix.clone());
        }

        query.push(" ORDER BY id");

        let files = query
            .build_query_as::<FileRecord>()
            .fetch_all(&mut *conn)
            .await?;

        Ok(files)
    }

    /// Delete a file row.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
