use thiserror::Error;

use crate::{
    application::{assets::AssetError, vault::VaultError},
    infra::error::InfraError,
};

/// Failures that end a `copy` or `watch` invocation.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("copy of `{path}` failed")]
    CopyFailed { path: String },
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
