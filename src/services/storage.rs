//! File storage behind a trait so the backing store can be swapped.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persists the bytes and returns the storage path for later retrieval.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String>;

    async fn read(&self, storage_path: &str) -> Result<Vec<u8>>;
}

/// Writes uploads as `{uuid}_{file_name}` under a configured directory.
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create upload dir: {}", self.root.display()))?;

        // uuid prefix keeps repeated uploads of the same name from colliding
        let stored_name = format!("{}_{}", uuid::Uuid::new_v4(), sanitize_file_name(file_name));
        let path = self.root.join(stored_name);

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write upload: {}", path.display()))?;

        Ok(path.to_string_lossy().into_owned())
    }

    async fn read(&self, storage_path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(storage_path)
            .await
            .with_context(|| format!("Failed to read stored file: {storage_path}"))
    }
}

/// Strips any path components from a client-supplied file name.
fn sanitize_file_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
}
