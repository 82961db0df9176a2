//! Folder types and repository.
//!
//! The repository is a thin SQL layer over the `folders` table. It performs no
//! hierarchy checks; those live in the service, which runs repository calls
//! inside a write transaction.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::{DriveError, Result};

/// A folder node in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: i64,
    /// Folder name, unique among its siblings.
    pub name: String,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<i64>,
    /// When the folder was created (UTC, `YYYY-MM-DD HH:MM:SS`).
    pub created_at: String,
}

impl Folder {
    /// Get created_at as a `DateTime<Utc>`, if the stored text parses.
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.and_utc())
    }

    /// Whether this is a root folder.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Folder name.
    pub name: String,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<i64>,
}

impl NewFolder {
    /// Create a root-level NewFolder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Rename and/or move request for a folder.
#[derive(Debug, Clone, Default)]
pub struct FolderUpdate {
    /// New folder name.
    pub name: Option<String>,
    /// New parent. `Some(None)` moves the folder to the root.
    pub parent_id: Option<Option<i64>>,
}

impl FolderUpdate {
    /// Create an empty FolderUpdate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the parent folder ID.
    pub fn parent_id(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none()
    }
}

/// How a single folder is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderKey {
    /// By ID.
    Id(i64),
    /// By name; the lowest ID wins when several folders share it.
    Name(String),
}

/// Which folders a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderScope {
    /// Every folder.
    #[default]
    All,
    /// Folders without a parent.
    Root,
    /// Direct children of a folder.
    Children(i64),
}

const FOLDER_COLUMNS: &str = "id, name, parent_id, created_at";

/// Repository for folder rows.
pub struct FolderRepository;

impl FolderRepository {
    /// Insert a folder and return the stored row.
    pub async fn create(conn: &mut SqliteConnection, folder: &NewFolder) -> Result<Folder> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO folders (name, parent_id) VALUES (?, ?) RETURNING id")
                .bind(&folder.name)
                .bind(folder.parent_id)
                .fetch_one(&mut *conn)
                .await?;

        Self::get_by_id(conn, id)
            .await?
            .ok_or_else(|| DriveError::NotFound("folder".to_string()))
    }

    /// Get a folder by ID.
    pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(folder)
    }

    /// Get the lowest-ID folder with the given name.
    pub async fn get_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE name = ? ORDER BY id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(folder)
    }

    /// Resolve a [`FolderKey`].
    pub async fn find(conn: &mut SqliteConnection, key: &FolderKey) -> Result<Option<Folder>> {
        match key {
            FolderKey::Id(id) => Self::get_by_id(conn, *id).await,
            FolderKey::Name(name) => Self::get_by_name(conn, name).await,
        }
    }

    /// Parent reference of a folder.
    ///
    /// Returns `None` if the folder does not exist, `Some(None)` for a root folder.
    pub async fn parent_of(conn: &mut SqliteConnection, id: i64) -> Result<Option<Option<i64>>> {
        let parent: Option<Option<i64>> =
            sqlx::query_scalar("SELECT parent_id FROM folders WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(parent)
    }

    /// Whether a folder exists.
    pub async fn exists(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        Ok(Self::parent_of(conn, id).await?.is_some())
    }

    /// List folders, ordered by name then ID.
    pub async fn list(conn: &mut SqliteConnection, scope: FolderScope) -> Result<Vec<Folder>> {
        let folders = match scope {
            FolderScope::All => {
                sqlx::query_as::<_, Folder>(&format!(
                    "SELECT {FOLDER_COLUMNS} FROM folders ORDER BY name, id"
                ))
                .fetch_all(&mut *conn)
                .await?
            }
            FolderScope::Root => {
                sqlx::query_as::<_, Folder>(&format!(
                    "SELECT {FOLDER_COLUMNS} FROM folders WHERE parent_id IS NULL ORDER BY name, id"
                ))
                .fetch_all(&mut *conn)
                .await?
            }
            FolderScope::Children(parent_id) => {
                sqlx::query_as::<_, Folder>(&format!(
                    "SELECT {FOLDER_COLUMNS} FROM folders WHERE parent_id = ? ORDER BY name, id"
                ))
                .bind(parent_id)
                .fetch_all(&mut *conn)
                .await?
            }
        };

        Ok(folders)
    }

    /// Overwrite a folder's name and parent.
    ///
    /// Returns the updated row, or None if no folder has this ID.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<Option<Folder>> {
        let result = sqlx::query("UPDATE folders SET name = ?, parent_id = ? WHERE id = ?")
            .bind(name)
            .bind(parent_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::get_by_id(conn, id).await
    }

    /// Delete a single folder row.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count direct subfolders.
    pub async fn count_children(conn: &mut SqliteConnection, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE parent_id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    /// Count files placed directly in a folder.
    pub async fn count_files(conn: &mut SqliteConnection, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE folder_id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    /// Count all folders.
    pub async fn count(conn: &mut SqliteConnection) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM folders")
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    /// Get the chain of folders from the root down to `id` (inclusive).
    ///
    /// Empty if the folder does not exist.
    pub async fn path(conn: &mut SqliteConnection, id: i64) -> Result<Vec<Folder>> {
        let mut path = Vec::new();
        let mut current_id = Some(id);
        let limit = Self::count(conn).await?;

        while let Some(folder_id) = current_id {
            if path.len() as i64 > limit {
                return Err(DriveError::Storage(format!(
                    "folder {id} has a cyclic ancestor chain"
                )));
            }
            match Self::get_by_id(conn, folder_id).await? {
                Some(folder) => {
                    current_id = folder.parent_id;
                    path.push(folder);
                }
                None => break,
            }
        }

        path.reverse();
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_folder() {
        let db = setup_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let folder = FolderRepository::create(&mut conn, &NewFolder::new("docs"))
            .await
            .unwrap();

        assert_eq!(folder.name, "docs");
        assert!(folder.is_root());
        assert!(folder.created_at_datetime().is_some());
    }

    #[tokio::test]
    async fn test_find_by_key() {
        let db = setup_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let first = FolderRepository::create(&mut conn, &NewFolder::new("shared"))
            .await
            .unwrap();
        let parent = FolderRepository::create(&mut conn, &NewFolder::new("other"))
            .await
            .unwrap();
        FolderRepository::create(&mut conn, &NewFolder::new("shared").with_parent(parent.id))
            .await
            .unwrap();

        let by_id = FolderRepository::find(&mut conn, &FolderKey::Id(parent.id))
            .await
            .unwrap();
        assert_eq!(by_id.unwrap().name, "other");

        let by_name = FolderRepository::find(&mut conn, &FolderKey::Name("shared".into()))
            .await
            .unwrap();
        assert_eq!(by_name.unwrap().id, first.id);

        assert!(FolderRepository::find(&mut conn, &FolderKey::Id(9999))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_parent_of() {
        let db = setup_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let root = FolderRepository::create(&mut conn, &NewFolder::new("root"))
            .await
            .unwrap();
        let child = FolderRepository::create(&mut conn, &NewFolder::new("child").with_parent(root.id))
            .await
            .unwrap();

        assert_eq!(FolderRepository::parent_of(&mut conn, root.id).await.unwrap(), Some(None));
        assert_eq!(
            FolderRepository::parent_of(&mut conn, child.id).await.unwrap(),
            Some(Some(root.id))
        );
        assert_eq!(FolderRepository::parent_of(&mut conn, 9999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_scopes() {
        let db = setup_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let b = FolderRepository::create(&mut conn, &NewFolder::new("b"))
            .await
            .unwrap();
        FolderRepository::create(&mut conn, &NewFolder::new("a"))
            .await
            .unwrap();
        FolderRepository::create(&mut conn, &NewFolder::new("z").with_parent(b.id))
            .await
            .unwrap();
        FolderRepository::create(&mut conn, &NewFolder::new("y").with_parent(b.id))
            .await
            .unwrap();

        let all = FolderRepository::list(&mut conn, FolderScope::All).await.unwrap();
        let names: Vec<_> = all.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "y", "z"]);

        let roots = FolderRepository::list(&mut conn, FolderScope::Root).await.unwrap();
        let names: Vec<_> = roots.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let children = FolderRepository::list(&mut conn, FolderScope::Children(b.id))
            .await
            .unwrap();
        let names: Vec<_> = children.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["y", "z"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = setup_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let folder = FolderRepository::create(&mut conn, &NewFolder::new("old"))
            .await
            .unwrap();

        let updated = FolderRepository::update(&mut conn, folder.id, "new", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "new");

        assert!(FolderRepository::update(&mut conn, 9999, "x", None)
            .await
            .unwrap()
            .is_none());

        assert!(FolderRepository::delete(&mut conn, folder.id).await.unwrap());
        assert!(!FolderRepository::delete(&mut conn, folder.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_path() {
        let db = setup_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let root = FolderRepository::create(&mut conn, &NewFolder::new("Root"))
            .await
            .unwrap();
        let level1 = FolderRepository::create(&mut conn, &NewFolder::new("Level1").with_parent(root.id))
            .await
            .unwrap();
        let level2 =
            FolderRepository::create(&mut conn, &NewFolder::new("Level2").with_parent(level1.id))
                .await
                .unwrap();

        let path = FolderRepository::path(&mut conn, level2.id).await.unwrap();
        let names: Vec<_> = path.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "Level1", "Level2"]);

        assert!(FolderRepository::path(&mut conn, 9999).await.unwrap().is_empty());
    }

    #[test]
    fn test_folder_update_builder() {
        assert!(FolderUpdate::new().is_empty());

        let update = FolderUpdate::new().name("renamed").parent_id(None);
        assert_eq!(update.name, Some("renamed".to_string()));
        assert_eq!(update.parent_id, Some(None));
        assert!(!update.is_empty());
    }
}
