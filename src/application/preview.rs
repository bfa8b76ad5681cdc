//! Keeps an exported copy of the note being edited up to date.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    application::{
        copy::CopyHandler,
        vault::{VaultError, VaultReader},
    },
    domain::{event::VaultEvent, file::VaultFile},
};

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error("failed to publish preview: {message}")]
    Sink { message: String },
}

impl PreviewError {
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }
}

/// Destination of freshly copied documents.
#[async_trait]
pub trait PreviewSink: Send + Sync {
    async fn publish(&self, file: &VaultFile, html: &str) -> Result<(), PreviewError>;
}

/// What handling one event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewOutcome {
    Published,
    CopyFailed,
    Ignored,
}

pub struct PreviewLoop {
    vault: Arc<dyn VaultReader>,
    handler: Arc<CopyHandler>,
    sink: Arc<dyn PreviewSink>,
}

impl PreviewLoop {
    pub fn new(
        vault: Arc<dyn VaultReader>,
        handler: Arc<CopyHandler>,
        sink: Arc<dyn PreviewSink>,
    ) -> Self {
        Self {
            vault,
            handler,
            sink,
        }
    }

    /// Handle events until every sender is dropped. Errors of a single event
    /// are logged and do not stop the loop.
    pub async fn run(&self, mut events: mpsc::Receiver<VaultEvent>) {
        while let Some(event) = events.recv().await {
            let kind = event.kind();
            let path = event.path().to_string();
            if let Err(err) = self.handle(event).await {
                warn!(
                    target = "application::preview",
                    op = "handle",
                    result = "error",
                    event = kind,
                    path = %path,
                    error = %err,
                    "preview update failed"
                );
            }
        }
        debug!(
            target = "application::preview",
            op = "run",
            "event stream closed"
        );
    }

    pub async fn handle(&self, event: VaultEvent) -> Result<PreviewOutcome, PreviewError> {
        match event {
            VaultEvent::Modified(path) | VaultEvent::Opened(path) => self.refresh(&path).await,
            VaultEvent::Deleted(path) => {
                info!(
                    target = "application::preview",
                    op = "handle",
                    event = "deleted",
                    path = %path,
                    "note deleted"
                );
                Ok(PreviewOutcome::Ignored)
            }
            VaultEvent::Renamed { from, to } => {
                info!(
                    target = "application::preview",
                    op = "handle",
                    event = "renamed",
                    from = %from,
                    to = %to,
                    "note renamed"
                );
                Ok(PreviewOutcome::Ignored)
            }
        }
    }

    async fn refresh(&self, path: &str) -> Result<PreviewOutcome, PreviewError> {
        let file = VaultFile::from_path(path);
        if !file.is_markdown() {
            debug!(
                target = "application::preview",
                op = "refresh",
                result = "skipped",
                path = %file.path,
                "not a markdown note"
            );
            return Ok(PreviewOutcome::Ignored);
        }

        let markdown = self.vault.read_text(&file.path).await?;
        match self.handler.copy(&markdown, &file, true).await {
            Some(html) => {
                self.sink.publish(&file, &html).await?;
                Ok(PreviewOutcome::Published)
            }
            None => Ok(PreviewOutcome::CopyFailed),
        }
    }
}
