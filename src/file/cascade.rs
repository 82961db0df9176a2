//! Forced deletion of a folder subtree.

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::Result;

/// Outcome of a folder deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    /// Number of folder rows removed, including the target.
    pub folders_removed: u64,
    /// Number of file rows removed.
    pub files_removed: u64,
    /// Blob locators of the removed files, for the caller to release.
    pub stored_names: Vec<String>,
}

/// IDs of a folder and all of its descendants, deepest first.
pub async fn subtree_ids(conn: &mut SqliteConnection, folder_id: i64) -> Result<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "WITH RECURSIVE subtree(id, depth) AS (
            SELECT id, 0 FROM folders WHERE id = ?
            UNION ALL
            SELECT f.id, s.depth + 1 FROM folders f JOIN subtree s ON f.parent_id = s.id
        )
        SELECT id FROM subtree ORDER BY depth DESC, id",
    )
    .bind(folder_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

/// Delete a folder, every descendant folder, and every file beneath them.
///
/// Runs on the caller's connection; callers pass a write transaction so the
/// subtree disappears as a whole or not at all. Does not rely on the schema's
/// `ON DELETE CASCADE`.
pub async fn cascade_delete(conn: &mut SqliteConnection, folder_id: i64) -> Result<DeleteSummary> {
    let ids = subtree_ids(conn, folder_id).await?;
    if ids.is_empty() {
        return Ok(DeleteSummary::default());
    }

    let mut select: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT stored_name FROM files WHERE folder_id IN (");
    push_id_list(&mut select, &ids);
    select.push(") ORDER BY id");
    let stored_names: Vec<String> = select
        .build_query_scalar::<String>()
        .fetch_all(&mut *conn)
        .await?;

    let mut delete_files: QueryBuilder<Sqlite> =
        QueryBuilder::new("DELETE FROM files WHERE folder_id IN (");
    push_id_list(&mut delete_files, &ids);
    delete_files.push(")");
    let files_removed = delete_files.build().execute(&mut *conn).await?.rows_affected();

    // Deepest first, so no row is removed before its children
    let mut folders_removed = 0;
    for id in &ids {
        folders_removed += sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }

    Ok(DeleteSummary {
        folders_removed,
        files_removed,
        stored_names,
    })
}

fn push_id_list(query: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
}
