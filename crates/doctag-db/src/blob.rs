//! Filesystem blob storage backend.
//!
//! Stores raw uploads under caller-generated, collision-free paths with
//! atomic write operations (temp file + rename).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use doctag_core::{BlobStore, Result};

/// Generate a fresh storage path for an upload.
///
/// Path format: `{owner_id}/{uuid}{ext}` where `ext` is the original
/// filename's extension (if any). The UUID makes the path collision-proof
/// independent of the display name.
pub fn generate_storage_path(owner_id: Uuid, original_filename: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    format!("{}/{}{}", owner_id, Uuid::new_v4(), ext)
}

/// Filesystem implementation of [`BlobStore`].
pub struct FilesystemBlobStore {
    base_path: PathBuf,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store rooted at the given directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    /// Validate that the store can write, read, and delete files.
    ///
    /// Performs a full round-trip at startup to catch filesystem issues
    /// (permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, path: &str, data: &[u8], content_type: &str) -> Result<()> {
        let full_path = self.full_path(path);
        debug!(
            subsystem = "db",
            component = "blob",
            op = "put",
            storage_path = %path,
            content_type = %content_type,
            size = data.len(),
            "Writing blob"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "blob: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "blob: File::create failed");
            e
        })?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "blob: rename failed");
            e
        })?;

        // 0644, no execute
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_path_preserves_extension() {
        let owner = Uuid::new_v4();
        let path = generate_storage_path(owner, "Quarterly Report.PDF");
        assert!(path.starts_with(&format!("{}/", owner)));
        assert!(path.ends_with(".pdf"));
    }

    #[test]
    fn test_storage_path_without_extension() {
        let owner = Uuid::new_v4();
        let path = generate_storage_path(owner, "README");
        assert!(path.starts_with(&format!("{}/", owner)));
        assert!(!path.contains('.'));
    }

    #[test]
    fn test_storage_paths_are_collision_free() {
        let owner = Uuid::new_v4();
        let a = generate_storage_path(owner, "same.txt");
        let b = generate_storage_path(owner, "same.txt");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_put_then_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());
        let owner = Uuid::new_v4();
        let path = generate_storage_path(owner, "notes.txt");

        store.put(&path, b"hello blob", "text/plain").await.unwrap();
        let on_disk = fs::read(dir.path().join(&path)).await.unwrap();
        assert_eq!(on_disk, b"hello blob");

        store.delete(&path).await.unwrap();
        assert!(!fs::try_exists(dir.path().join(&path)).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_path_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());
        store.delete("nobody/home.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_validate_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());
        store.validate().await.unwrap();
    }
}
