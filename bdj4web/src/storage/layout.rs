//! Storage layout configuration

use std::path::PathBuf;

use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// Storage layout for the web endpoints
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory for all storage
    pub base_dir: PathBuf,

    /// Telemetry log written by the desktop client's reporter.
    /// Defaults to `<base_dir>/bdj4info.txt`.
    pub telemetry_log: Option<PathBuf>,
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            telemetry_log: None,
        }
    }

    /// Get the settings file path
    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    /// Marquee store: one content file and one optional key file per tag
    pub fn marquee_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("marquee"))
    }

    /// Support uploads, one subdirectory per client identifier
    pub fn uploads_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("uploads"))
    }

    /// Connectivity test uploads
    pub fn test_uploads_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("testupload"))
    }

    /// Install telemetry log
    pub fn telemetry_log_file(&self) -> File {
        match &self.telemetry_log {
            Some(path) => File::new(path.clone()),
            None => File::new(self.base_dir.join("bdj4info.txt")),
        }
    }

    /// Setup the storage layout (create directories)
    pub async fn setup(&self) -> Result<(), crate::errors::WebError> {
        self.marquee_dir().create().await?;
        self.uploads_dir().create().await?;
        self.test_uploads_dir().create().await?;
        Ok(())
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        #[cfg(target_os = "linux")]
        let base_dir = PathBuf::from("/var/lib/bdj4web");

        #[cfg(not(target_os = "linux"))]
        let base_dir = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bdj4web");

        Self::new(base_dir)
    }
}
