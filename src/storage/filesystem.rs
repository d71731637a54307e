use crate::storage::KeyValueStore;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::error;
use uuid::Uuid;

/// Stores each key as `<key>.json` under a data directory.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    data_dir: PathBuf,
}

impl FileSystemStore {
    /// Creates a new FileSystemStore instance.
    /// Ensures the data directory exists.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let path_buf = data_dir.as_ref().to_path_buf();
        // Ensure directory exists (synchronous for simplicity in constructor)
        if let Err(e) = std::fs::create_dir_all(&path_buf) {
            // Log error but proceed; async methods will handle failures
            error!(
                path = %path_buf.display(),
                error = %e,
                "Failed to create data directory during initialization"
            );
        }
        Self { data_dir: path_buf }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            bail!("Invalid storage key '{}'", key);
        }
        Ok(self.data_dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileSystemStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read storage file: {}", path.display()))
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;

        // Ensure directory exists before writing
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir)
                .await
                .with_context(|| {
                    format!("Failed to create data directory '{}'", self.data_dir.display())
                })?;
        }

        // Write to a sibling temp file and rename over the target so readers
        // never observe a partially written value.
        let tmp_path = self.data_dir.join(format!(".{}.{}.tmp", key, Uuid::new_v4()));
        let mut file = fs::File::create(&tmp_path)
            .await
            .with_context(|| {
                format!("Failed to create temp file for writing: {}", tmp_path.display())
            })?;
        file.write_all(value.as_bytes())
            .await
            .with_context(|| format!("Failed to write to temp file: {}", tmp_path.display()))?;
        file.sync_all()
            .await
            .with_context(|| format!("Failed to flush temp file: {}", tmp_path.display()))?;
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e)
                .with_context(|| format!("Failed to replace storage file: {}", path.display()));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(_) => Ok(()),
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to delete storage file: {}", path.display()))
            }
        }
    }
}
