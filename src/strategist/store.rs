// SPDX-License-Identifier: MIT

//! Persistence collaborator for the final artifact

use crate::adk::error::StrategistError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// `save(identifier, content) -> storage path`
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn save(&self, id: &str, content: &str) -> Result<PathBuf, StrategistError>;
}

/// Writes `<id>.md` files under a directory, creating it on first use
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.md", id))
    }
}

#[async_trait]
impl ArtifactStore for FileStore {
    async fn save(&self, id: &str, content: &str) -> Result<PathBuf, StrategistError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StrategistError::Persistence {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.path_for(id);
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| StrategistError::Persistence {
                path: path.clone(),
                source,
            })?;

        log::info!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("nested").join("output"));

        let path = store.save("abc", "# Strategy").await.unwrap();
        assert_eq!(path, store.dir().join("abc.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Strategy");
    }

    #[tokio::test]
    async fn test_save_under_a_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let store = FileStore::new(blocker.join("output"));
        let err = store.save("abc", "x").await.unwrap_err();
        assert!(matches!(err, StrategistError::Persistence { .. }));
    }
}
