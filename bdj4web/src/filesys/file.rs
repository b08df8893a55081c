//! File operations

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::errors::WebError;

/// A file wrapper with path
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    /// Create a new file reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component, if any
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Sibling file with `suffix` appended to the full file name
    pub fn with_suffix(&self, suffix: &str) -> File {
        let mut name = self.path.as_os_str().to_owned();
        name.push(suffix);
        File::new(PathBuf::from(name))
    }

    /// Read file contents as bytes
    pub async fn read_bytes(&self) -> Result<Vec<u8>, WebError> {
        Ok(fs::read(&self.path).await?)
    }

    /// Read file contents as string
    pub async fn read_string(&self) -> Result<String, WebError> {
        Ok(fs::read_to_string(&self.path).await?)
    }

    /// Read and deserialize JSON file contents
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, WebError> {
        let contents = self.read_string().await?;
        let value = serde_json::from_str(&contents)?;
        Ok(value)
    }

    /// Read the file, mapping "not found" to `None`
    pub async fn read_optional(&self) -> Result<Option<Vec<u8>>, WebError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write bytes to file, replacing any previous content
    pub async fn write_bytes(&self, contents: &[u8]) -> Result<(), WebError> {
        self.ensure_parent().await?;

        let mut file = fs::File::create(&self.path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Create the file with `contents` only if it does not exist yet.
    ///
    /// Fails with an `AlreadyExists` IO error when the file is already there.
    /// The content is staged in a temp file and hard-linked into place, so
    /// the file never becomes visible half-written.
    pub async fn create_exclusive(&self, contents: &[u8]) -> Result<(), WebError> {
        self.ensure_parent().await?;

        let temp = self.temp_sibling();
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(temp.path())
            .await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);

        let linked = fs::hard_link(temp.path(), &self.path).await;
        if let Err(e) = temp.delete().await {
            warn!("Failed to remove {}: {}", temp.path().display(), e);
        }
        linked?;
        Ok(())
    }

    /// Delete the file
    pub async fn delete(&self) -> Result<(), WebError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Temp file next to this one, hidden and unique per call
    pub fn temp_sibling(&self) -> File {
        let name = self.name().unwrap_or("file");
        let temp_name = format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple());
        File::new(self.path.with_file_name(temp_name))
    }

    /// Atomic write using a temporary file in the same directory.
    ///
    /// Readers observe either the previous content or `contents`, never a
    /// partial write. The temp file is left behind if the rename fails.
    pub async fn write_atomic(&self, contents: &[u8]) -> Result<(), WebError> {
        let temp = self.temp_sibling();
        temp.write_bytes(contents)
            .await
            .map_err(|e| WebError::StorageError(format!("{}: {}", temp.path.display(), e)))?;
        self.replace_with(&temp).await
    }

    /// Rename `source` over this file
    pub async fn replace_with(&self, source: &File) -> Result<(), WebError> {
        fs::rename(&source.path, &self.path).await.map_err(|e| {
            WebError::StorageError(format!(
                "rename {} -> {}: {}",
                source.path.display(),
                self.path.display(),
                e
            ))
        })
    }

    async fn ensure_parent(&self) -> Result<(), WebError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_suffix() {
        let file = File::new("/tmp/x/data.txt");
        assert_eq!(file.with_suffix(".gz").path(), Path::new("/tmp/x/data.txt.gz"));
    }

    #[test]
    fn test_temp_sibling_is_hidden_and_unique() {
        let file = File::new("/tmp/x/data.txt");
        let a = file.temp_sibling();
        let b = file.temp_sibling();
        assert_ne!(a.path(), b.path());
        assert_eq!(a.path().parent(), file.path().parent());
        assert!(a.name().unwrap().starts_with(".data.txt."));
        assert!(a.name().unwrap().ends_with(".tmp"));
    }
}
