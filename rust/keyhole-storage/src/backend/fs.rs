use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use base58::ToBase58;

use crate::StorageError;

use super::StorageBackend;

/// A basic file-system-based [StorageBackend] implementation, the native
/// stand-in for durable storage. All values are stored inside a root
/// directory as files named after their (base58-encoded) keys.
#[derive(Clone, Debug)]
pub struct FileSystemStorageBackend {
    root_dir: PathBuf,
}

impl FileSystemStorageBackend {
    /// Creates a new [`FileSystemStorageBackend`] that stores files in
    /// `root_dir`, creating the directory if needed.
    pub async fn new<Pathlike>(root_dir: Pathlike) -> Result<Self, StorageError>
    where
        Pathlike: AsRef<Path>,
    {
        let root_dir = root_dir.as_ref().to_owned();
        tokio::fs::create_dir_all(&root_dir)
            .await
            .map_err(|error| StorageError::Backend(format!("{error}")))?;
        Ok(Self { root_dir })
    }

    /// The directory values are stored in
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn make_path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key.as_bytes().to_base58())
    }
}

#[async_trait]
impl StorageBackend for FileSystemStorageBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.make_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StorageError::Backend(format!("{error}"))),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.make_path(key);
        let staging = path.with_extension("partial");

        // Readers only ever observe the previous value or the new one
        tokio::fs::write(&staging, value)
            .await
            .map_err(|error| StorageError::Backend(format!("{error}")))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|error| StorageError::Backend(format!("{error}")))?;

        tracing::debug!(path = %path.display(), "Persisted value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[tokio::test]
    async fn it_survives_reopening_the_directory() -> Result<()> {
        let tempdir = tempfile::tempdir()?;

        let storage = FileSystemStorageBackend::new(tempdir.path()).await?;
        storage.set("token", "a/b+c=".into()).await?;
        drop(storage);

        let reopened = FileSystemStorageBackend::new(tempdir.path()).await?;
        assert_eq!(reopened.get("token").await?, Some("a/b+c=".into()));
        Ok(())
    }

    #[tokio::test]
    async fn it_reports_missing_keys_as_none() -> Result<()> {
        let tempdir = tempfile::tempdir()?;
        let storage = FileSystemStorageBackend::new(tempdir.path().join("nested")).await?;

        assert_eq!(storage.get("token").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn it_leaves_no_staging_file_behind() -> Result<()> {
        let tempdir = tempfile::tempdir()?;
        let storage = FileSystemStorageBackend::new(tempdir.path()).await?;

        storage.set("token", "abc".into()).await?;

        let entries = std::fs::read_dir(tempdir.path())?.count();
        assert_eq!(entries, 1);
        Ok(())
    }
}
