//! Terminal and filesystem adapters for user-facing output.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{info, warn};

use crate::{
    application::{
        copy::Notifier,
        preview::{PreviewError, PreviewSink},
    },
    domain::file::VaultFile,
};

/// Reports failed copies on standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        warn!(target = "infra::notifier", op = "notify", "{message}");
        eprintln!("{message}");
    }
}

/// Writes every published preview to one file, replacing its contents.
#[derive(Debug, Clone)]
pub struct FilePreviewSink {
    path: PathBuf,
}

impl FilePreviewSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PreviewSink for FilePreviewSink {
    async fn publish(&self, file: &VaultFile, html: &str) -> Result<(), PreviewError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| PreviewError::sink(err.to_string()))?;
        }
        fs::write(&self.path, html).await.map_err(|err| {
            PreviewError::sink(format!("cannot write `{}`: {err}", self.path.display()))
        })?;

        info!(
            target = "infra::notifier",
            op = "publish",
            result = "ok",
            note = %file.path,
            output = %self.path.display(),
            bytes = html.len(),
            "preview updated"
        );
        Ok(())
    }
}
