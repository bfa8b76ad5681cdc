use async_trait::async_trait;
use thiserror::Error;

use crate::{
    application::{
        dom::{Element, Node},
        vault::VaultError,
    },
    domain::options::RenderOptions,
};

use super::container::{RenderContainer, RenderScope};

/// One note to render, immutable for the duration of a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Markdown source captured from the editor or read from the vault.
    pub source_text: String,
    /// Vault-relative path of the note; relative links resolve against it.
    pub source_path: String,
    pub options: RenderOptions,
}

impl RenderRequest {
    pub fn new(
        source_text: impl Into<String>,
        source_path: impl Into<String>,
        options: RenderOptions,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            source_path: source_path.into(),
            options,
        }
    }
}

/// Structured errors surfaced while producing the rendered tree. Any of them
/// aborts the copy that triggered the render.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
    #[error("markup rewrite failed: {message}")]
    Markup { message: String },
    #[error(transparent)]
    Vault(#[from] VaultError),
}

impl RenderError {
    pub fn markdown(message: impl Into<String>) -> Self {
        Self::Markdown {
            message: message.into(),
        }
    }

    pub fn markup(message: impl Into<String>) -> Self {
        Self::Markup {
            message: message.into(),
        }
    }
}

/// Renders markdown into a container, block by block.
///
/// Implementations append each finished top-level block to the container, which
/// raises a block-completion signal. Work that outlives the call (late
/// post-processing of a block) must be spawned on `scope`; it is aborted once
/// the tree has settled.
#[async_trait]
pub trait MarkdownRenderer: Send + Sync {
    async fn render(
        &self,
        markdown: &str,
        container: &RenderContainer,
        source_path: &str,
        scope: &RenderScope,
    ) -> Result<(), RenderError>;
}

/// Where a block sits within the note being rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContext {
    pub source_path: String,
    pub index: usize,
}

/// Late rewrite of a single rendered block, such as a diagram or query result.
#[async_trait]
pub trait BlockPostProcessor: Send + Sync {
    /// Returns the replacement for `block`, or `None` to leave it alone.
    async fn process(&self, block: Element, context: BlockContext) -> Option<Node>;
}
