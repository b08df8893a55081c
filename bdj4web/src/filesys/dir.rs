//! Directory operations

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::errors::WebError;
use crate::filesys::file::File;
use crate::filesys::segment::{RelativeName, Segment};

/// A directory wrapper with path
#[derive(Debug, Clone)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    /// Create a new directory reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory (and parents)
    pub async fn create(&self) -> Result<(), WebError> {
        fs::create_dir_all(&self.path).await?;
        Ok(())
    }

    /// Get a file within this directory
    pub fn file(&self, name: &str) -> File {
        File::new(self.path.join(name))
    }

    /// Get a file at a validated relative path below this directory
    pub fn file_at(&self, name: &RelativeName) -> File {
        File::new(self.path.join(name.as_path()))
    }

    /// Get a subdirectory named by a validated segment
    pub fn subdir(&self, name: &Segment) -> Dir {
        Dir::new(self.path.join(name.as_str()))
    }
}
