//! Database schema and migrations for Drive.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded. The schema_version table tracks which ones have run.

/// Database migrations, in application order.
pub const MIGRATIONS: &[&str] = &[
    // v1: folder hierarchy
    r#"
CREATE TABLE folders (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    parent_id   INTEGER REFERENCES folders(id) ON DELETE CASCADE,  -- NULL for root folders
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_folders_parent_name ON folders(parent_id, name);
CREATE INDEX idx_folders_name ON folders(name);
"#,
    // v2: file records
    r#"
CREATE TABLE files (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    folder_id       INTEGER REFERENCES folders(id) ON DELETE CASCADE,  -- NULL for root level
    original_name   TEXT NOT NULL,                                     -- virtual path
    stored_name     TEXT NOT NULL,                                     -- blob locator
    size            INTEGER NOT NULL CHECK (size >= 0),
    mime_type       TEXT NOT NULL,
    owner_id        INTEGER,
    uploaded_at     TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_folder_id ON files(folder_id);
CREATE INDEX idx_files_original_name ON files(original_name);
CREATE INDEX idx_files_owner_id ON files(owner_id);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_valid_sql() {
        for migration in MIGRATIONS {
            assert!(!migration.trim().is_empty());
            assert!(migration.contains("CREATE TABLE") || migration.contains("CREATE INDEX"));
        }
    }

    #[test]
    fn test_folders_migration() {
        let folders = MIGRATIONS[0];
        assert!(folders.contains("CREATE TABLE folders"));
        assert!(folders.contains("parent_id"));
        assert!(folders.contains("ON DELETE CASCADE"));
    }

    #[test]
    fn test_files_migration() {
        let files = MIGRATIONS[1];
        assert!(files.contains("CREATE TABLE files"));
        assert!(files.contains("original_name"));
        assert!(files.contains("stored_name"));
        assert!(files.contains("mime_type"));
        assert!(files.contains("owner_id"));
    }
}
