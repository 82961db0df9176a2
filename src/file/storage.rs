//! Blob storage for uploaded file contents.
//!
//! Blobs live under a base directory, sharded by the first two characters of
//! their stored name:
//!
//! ```text
//! {base}/
//! ├── 3f/
//! │   └── 3f2a9c1e-....pdf
//! └── a0/
//!     └── a07b4d22-....bin
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::{DriveError, Result};

/// Extension used when the client name has none, or one unfit for a stored name.
const FALLBACK_EXTENSION: &str = "bin";

const MAX_EXTENSION_LEN: usize = 16;

/// Sharded blob store addressed by stored name.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Open a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write `content` under a freshly generated stored name and return it.
    pub async fn save(&self, content: &[u8], original_name: &str) -> Result<String> {
        let stored_name = Self::stored_name_for(original_name);
        self.save_with_name(content, &stored_name).await?;
        Ok(stored_name)
    }

    /// Write `content` under an existing stored name.
    pub async fn save_with_name(&self, content: &[u8], stored_name: &str) -> Result<()> {
        let blob_path = self.path_for(stored_name)?;
        if let Some(shard) = blob_path.parent() {
            fs::create_dir_all(shard).await?;
        }
        fs::write(&blob_path, content).await?;
        Ok(())
    }

    /// Read a blob back.
    pub async fn load(&self, stored_name: &str) -> Result<Vec<u8>> {
        let blob_path = self.path_for(stored_name)?;
        match fs::read(&blob_path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DriveError::NotFound(format!("blob {stored_name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a blob. Returns `false` if it was already gone.
    pub async fn delete(&self, stored_name: &str) -> Result<bool> {
        let blob_path = self.path_for(stored_name)?;
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, stored_name: &str) -> bool {
        match self.path_for(stored_name) {
            Ok(blob_path) => fs::try_exists(&blob_path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Location of a blob on disk.
    ///
    /// Stored names are generated by this store, so anything that could step
    /// outside the base directory is refused.
    pub fn path_for(&self, stored_name: &str) -> Result<PathBuf> {
        if stored_name.is_empty()
            || stored_name.contains(['/', '\\'])
            || stored_name == "."
            || stored_name == ".."
        {
            return Err(DriveError::Validation(format!(
                "invalid stored name: {stored_name:?}"
            )));
        }
        Ok(self.base_path.join(shard(stored_name)).join(stored_name))
    }

    /// Generate a stored name: a v4 UUID plus the client name's extension.
    pub fn stored_name_for(original_name: &str) -> String {
        format!("{}.{}", Uuid::new_v4(), extension(original_name))
    }
}

fn shard(stored_name: &str) -> &str {
    match stored_name.char_indices().nth(2) {
        Some((end, _)) => &stored_name[..end],
        None => stored_name,
    }
}

fn extension(original_name: &str) -> &str {
    let file_name = original_name.rsplit('/').next().unwrap_or(original_name);
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or(FALLBACK_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStorage) {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("blobs")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_new_creates_base_directory() {
        let (dir, storage) = setup();
        assert!(dir.path().join("blobs").is_dir());
        assert_eq!(storage.base_path(), dir.path().join("blobs"));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (_dir, storage) = setup();

        let stored_name = storage.save(b"quarterly numbers", "reports/q1.csv").await.unwrap();
        assert!(stored_name.ends_with(".csv"));
        assert!(storage.exists(&stored_name).await);

        let shard_dir = storage.base_path().join(&stored_name[..2]);
        assert!(shard_dir.is_dir());

        assert_eq!(storage.load(&stored_name).await.unwrap(), b"quarterly numbers");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, storage) = setup();
        let stored_name = storage.save(b"x", "x.txt").await.unwrap();

        assert!(storage.delete(&stored_name).await.unwrap());
        assert!(!storage.delete(&stored_name).await.unwrap());
        assert!(!storage.exists(&stored_name).await);
        assert!(matches!(
            storage.load(&stored_name).await,
            Err(DriveError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_binary_content_survives() {
        let (_dir, storage) = setup();
        let content: Vec<u8> = (0..=255).collect();

        let stored_name = storage.save(&content, "blob").await.unwrap();
        assert_eq!(storage.load(&stored_name).await.unwrap(), content);
    }

    #[test]
    fn test_path_for_rejects_traversal() {
        let (_dir, storage) = setup();

        assert!(storage.path_for("../etc/passwd").is_err());
        assert!(storage.path_for("a\\b").is_err());
        assert!(storage.path_for("..").is_err());
        assert!(storage.path_for("").is_err());

        let path = storage.path_for("ab12.txt").unwrap();
        assert_eq!(path, storage.base_path().join("ab").join("ab12.txt"));
    }

    #[test]
    fn test_stored_name_for() {
        let a = FileStorage::stored_name_for("photo.JPG");
        let b = FileStorage::stored_name_for("photo.JPG");
        assert_ne!(a, b);
        assert!(a.ends_with(".JPG"));

        assert!(FileStorage::stored_name_for("Makefile").ends_with(".bin"));
        assert!(FileStorage::stored_name_for("dir.d/noext").ends_with(".bin"));
        assert!(FileStorage::stored_name_for(".hidden").ends_with(".bin"));

        assert!(FileStorage::stored_name_for("report.v1\\final").ends_with(".bin"));
        assert!(FileStorage::stored_name_for("notes.tar gz").ends_with(".bin"));
        assert!(FileStorage::stored_name_for("a.abcdefghijklmnopq").ends_with(".bin"));
        assert!(FileStorage::stored_name_for("a.tar.gz").ends_with(".gz"));
    }

    #[tokio::test]
    async fn test_save_with_unusual_extension() {
        let (_dir, storage) = setup();

        let stored_name = storage.save(b"x", "report.v1\\final").await.unwrap();
        assert!(stored_name.ends_with(".bin"));
        assert_eq!(storage.load(&stored_name).await.unwrap(), b"x");
    }

    #[test]
    fn test_shard() {
        assert_eq!(shard("abcdef"), "ab");
        assert_eq!(shard("x"), "x");
        assert_eq!(shard("日本語"), "日本");
    }
}
