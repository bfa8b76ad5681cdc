//! Read access to the files of a vault.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault file `{path}` not found")]
    NotFound { path: String },
    #[error("vault path `{path}` is outside the vault")]
    OutsideVault { path: String },
    #[error("failed to read vault file `{path}`: {message}")]
    Read { path: String, message: String },
}

impl VaultError {
    pub fn read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Read {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait VaultReader: Send + Sync {
    /// Absolute location of the vault; the renderer derives image URIs from it.
    fn base_path(&self) -> &Path;

    async fn read_binary(&self, path: &str) -> Result<Bytes, VaultError>;

    async fn read_text(&self, path: &str) -> Result<String, VaultError> {
        let bytes = self.read_binary(path).await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|err| VaultError::read(path, format!("not valid UTF-8: {err}")))
    }
}
