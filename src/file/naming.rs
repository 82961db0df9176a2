//! Sibling name checks for folders.

use sqlx::SqliteConnection;

use crate::{DriveError, Result};

/// Whether a folder named `name` already exists under `parent_id`.
///
/// Names compare case-sensitively. Root folders (`parent_id = None`) form
/// their own scope. `exclude_id` skips the folder being renamed.
pub async fn sibling_conflict(
    conn: &mut SqliteConnection,
    name: &str,
    parent_id: Option<i64>,
    exclude_id: Option<i64>,
) -> Result<bool> {
    // `IS` treats two NULLs as equal, so one statement covers both scopes
    let conflict: bool = sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM folders
            WHERE name = ? AND parent_id IS ? AND (? IS NULL OR id != ?)
        )",
    )
    .bind(name)
    .bind(parent_id)
    .bind(exclude_id)
    .bind(exclude_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(conflict)
}

/// Validate and trim a folder name.
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DriveError::Validation("folder name is required".to_string()));
    }
    if name.contains('/') {
        return Err(DriveError::Validation(
            "folder name must not contain '/'".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Fail with a conflict if the name is taken among the target siblings.
pub async fn ensure_unique(
    conn: &mut SqliteConnection,
    name: &str,
    parent_id: Option<i64>,
    exclude_id: Option<i64>,
) -> Result<()> {
    if sibling_conflict(conn, name, parent_id, exclude_id).await? {
        return Err(DriveError::Conflict(format!(
            "a folder named '{name}' already exists in the target directory"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{FolderRepository, NewFolder};
    use crate::Database;

    #[tokio::test]
    async fn test_sibling_conflict_scopes() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let docs = FolderRepository::create(&mut conn, &NewFolder::new("docs"))
            .await
            .unwrap();
        FolderRepository::create(&mut conn, &NewFolder::new("notes").with_parent(docs.id))
            .await
            .unwrap();

        assert!(sibling_conflict(&mut conn, "docs", None, None).await.unwrap());
        assert!(!sibling_conflict(&mut conn, "Docs", None, None).await.unwrap());
        assert!(!sibling_conflict(&mut conn, "docs", Some(docs.id), None)
            .await
            .unwrap());
        assert!(sibling_conflict(&mut conn, "notes", Some(docs.id), None)
            .await
            .unwrap());
        assert!(!sibling_conflict(&mut conn, "notes", None, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_sibling_conflict_excludes_self() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let docs = FolderRepository::create(&mut conn, &NewFolder::new("docs"))
            .await
            .unwrap();

        assert!(!sibling_conflict(&mut conn, "docs", None, Some(docs.id))
            .await
            .unwrap());
        assert!(matches!(
            ensure_unique(&mut conn, "docs", None, None).await,
            Err(DriveError::Conflict(_))
        ));
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  reports ").unwrap(), "reports");
        assert!(matches!(validate_name(""), Err(DriveError::Validation(_))));
        assert!(matches!(validate_name("   "), Err(DriveError::Validation(_))));
        assert!(matches!(validate_name("a/b"), Err(DriveError::Validation(_))));
    }
}
