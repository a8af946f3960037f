use crate::core::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Directory-backed storage used by the one-shot exporter.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn full_path(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data).await?;
        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("nested/out"));

        storage.write_file("jira-export.zip", b"PK").await.unwrap();

        assert!(storage.full_path("jira-export.zip").exists());
        assert_eq!(
            std::fs::read(storage.full_path("jira-export.zip")).unwrap(),
            b"PK"
        );
    }

    #[tokio::test]
    async fn test_write_replaces_existing_archive() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        storage.write_file("out.zip", b"first").await.unwrap();
        storage.write_file("out.zip", b"second").await.unwrap();

        assert_eq!(std::fs::read(storage.full_path("out.zip")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_write_into_file_path_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("blocker"), b"x").unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("blocker"));

        let err = storage.write_file("out.zip", b"PK").await.unwrap_err();
        assert!(matches!(err, crate::utils::error::ArchiverError::IoError(_)));
    }
}
