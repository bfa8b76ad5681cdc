//! Entry point of a copy: one note in, one portable HTML document out.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::{error, info};

use crate::{
    application::{
        document::assemble_document,
        pipeline::DocumentRenderer,
        render::{RenderError, RenderRequest},
    },
    domain::{file::VaultFile, options::RenderOptions},
};

static PROCESS_GATE: Lazy<CopyGate> = Lazy::new(CopyGate::new);

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("another copy is already running")]
    Busy,
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Receives user-facing messages about failed copies.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Single-flight flag shared by every copy handler holding a clone.
#[derive(Debug, Clone, Default)]
pub struct CopyGate {
    running: Arc<AtomicBool>,
}

impl CopyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// The gate shared by all handlers of this process.
    pub fn process() -> Self {
        PROCESS_GATE.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn acquire(&self) -> Result<CopyGuard, CopyError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CopyError::Busy)?;
        Ok(CopyGuard {
            running: Arc::clone(&self.running),
        })
    }
}

/// Marks a copy as running until dropped.
#[derive(Debug)]
pub struct CopyGuard {
    running: Arc<AtomicBool>,
}

impl Drop for CopyGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

pub struct CopyHandler {
    renderer: DocumentRenderer,
    notifier: Arc<dyn Notifier>,
    options: RenderOptions,
    gate: CopyGate,
}

impl CopyHandler {
    pub fn new(
        renderer: DocumentRenderer,
        notifier: Arc<dyn Notifier>,
        options: RenderOptions,
    ) -> Self {
        Self {
            renderer,
            notifier,
            options,
            gate: CopyGate::process(),
        }
    }

    pub fn with_gate(mut self, gate: CopyGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn gate(&self) -> &CopyGate {
        &self.gate
    }

    /// Copy `markdown` from `file`. Failures are reported to the notifier and
    /// yield `None`.
    pub async fn copy(
        &self,
        markdown: &str,
        file: &VaultFile,
        is_full_document: bool,
    ) -> Option<String> {
        match self.try_copy(markdown, file, is_full_document).await {
            Ok(html) => Some(html),
            Err(err) => {
                self.notifier.notify(&format!("copy failed: {err}"));
                error!(
                    target = "application::copy",
                    op = "copy",
                    result = "error",
                    path = %file.path,
                    error = %err,
                    "copy failed"
                );
                None
            }
        }
    }

    pub async fn try_copy(
        &self,
        markdown: &str,
        file: &VaultFile,
        is_full_document: bool,
    ) -> Result<String, CopyError> {
        info!(
            target = "application::copy",
            op = "copy",
            path = %file.path,
            full_document = is_full_document,
            "Copying \"{}\"",
            file.path
        );
        let _guard = self.gate.acquire()?;

        let request = RenderRequest::new(markdown, file.path.clone(), self.options.clone());
        let tree = self.renderer.render_document(&request).await?;
        let html = assemble_document(&tree.outer_html(), file, is_full_document, &self.options);

        info!(
            target = "application::copy",
            op = "copy",
            result = "ok",
            path = %file.path,
            bytes = html.len(),
            "copy finished"
        );
        Ok(html)
    }
}
