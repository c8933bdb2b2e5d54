//! On-disk storage for durable sessions, one JSON file per backend.

use shared::models::Session;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("stored session is unreadable: {0}")]
    Format(#[from] serde_json::Error),
}

/// Location of one backend's durable session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionVault {
    path: PathBuf,
}

impl SessionVault {
    pub fn new(dir: impl AsRef<Path>, backend: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{backend}.json")),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session, if any.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<Option<Session>, VaultError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Replace the stored session.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub async fn save(&self, session: &Session) -> Result<(), VaultError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec_pretty(session)?).await?;
        restrict_permissions(&staging).await?;
        fs::rename(&staging, &self.path).await?;
        debug!(path = %self.path.display(), "stored durable session");
        Ok(())
    }

    /// Remove the stored session. Missing files are not an error.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be removed.
    pub async fn clear(&self) -> Result<(), VaultError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed durable session");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::context::test_implementations::sample_session;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let vault = SessionVault::new(dir.path(), "catalog");

        assert!(vault.load().await.unwrap().is_none());
        vault.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let dir = tempdir().unwrap();
        let vault = SessionVault::new(dir.path().join("nested"), "resume");
        let session = sample_session("resume");

        vault.save(&session).await.unwrap();
        assert!(vault.path().ends_with("nested/resume.json"));
        assert_eq!(vault.load().await.unwrap(), Some(session));

        vault.clear().await.unwrap();
        assert!(!vault.path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let vault = SessionVault::new(dir.path(), "catalog");
        std::fs::write(vault.path(), b"not json").unwrap();

        assert!(matches!(vault.load().await, Err(VaultError::Format(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let vault = SessionVault::new(dir.path(), "catalog");
        vault.save(&sample_session("catalog")).await.unwrap();

        let mode = std::fs::metadata(vault.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
