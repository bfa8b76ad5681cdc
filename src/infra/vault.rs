//! Filesystem-backed vault access.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::application::vault::{VaultError, VaultReader};

/// A vault rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Open the vault at `root`. The root must exist; it is stored canonicalized
    /// so image URIs derived from it are stable.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let root = std::fs::canonicalize(root.as_ref())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Vault-relative form of `path`, which may be absolute or relative to the
    /// current directory.
    pub fn relative_path(&self, path: &Path) -> Result<String, VaultError> {
        let display = path.display().to_string();
        let absolute = std::fs::canonicalize(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => VaultError::NotFound {
                path: display.clone(),
            },
            _ => VaultError::read(display.clone(), err.to_string()),
        })?;
        let relative = absolute
            .strip_prefix(&self.root)
            .map_err(|_| VaultError::OutsideVault { path: display })?;
        Ok(relative.to_string_lossy().replace('\\', "/"))
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, VaultError> {
        let relative = Path::new(path);
        if relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(VaultError::OutsideVault {
                path: path.to_string(),
            });
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl VaultReader for FsVault {
    fn base_path(&self) -> &Path {
        &self.root
    }

    async fn read_binary(&self, path: &str) -> Result<Bytes, VaultError> {
        let absolute = self.resolve(path)?;
        match fs::read(&absolute).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(VaultError::NotFound {
                path: path.to_string(),
            }),
            Err(err) => Err(VaultError::read(path, err.to_string())),
        }
    }
}
