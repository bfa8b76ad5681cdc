//! Inlining of images and vector graphics so the copied document carries no
//! references back into the vault.

mod raster;
mod resolver;

use thiserror::Error;

use crate::application::vault::VaultError;

pub use raster::{RasterConverter, RasterOutcome};
pub use resolver::AssetInliner;

/// Why a single asset could not be inlined. These never abort a copy.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("cannot load `{source_url}`: {message}")]
    Load { source_url: String, message: String },
    #[error("unsupported image source scheme `{scheme}`")]
    UnsupportedScheme { scheme: String },
    #[error("cannot decode image: {message}")]
    Decode { message: String },
    #[error("cannot encode image: {message}")]
    Encode { message: String },
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error(transparent)]
    Vault(#[from] VaultError),
}

impl AssetError {
    pub fn load(source_url: impl Into<String>, message: impl ToString) -> Self {
        Self::Load {
            source_url: source_url.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(message: impl ToString) -> Self {
        Self::Decode {
            message: message.to_string(),
        }
    }

    pub fn encode(message: impl ToString) -> Self {
        Self::Encode {
            message: message.to_string(),
        }
    }
}
