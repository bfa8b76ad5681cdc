//! Markdown to cleaned, self-contained element tree.

use std::sync::Arc;

use tracing::debug;

use crate::application::{
    assets::AssetInliner,
    dom::Element,
    render::{MarkdownRenderer, RenderError, RenderRequest, SettleDetector, preprocess_markdown},
    transform::apply_structural_steps,
};

/// Renders one note into a detached tree and rewrites it for export.
pub struct DocumentRenderer {
    renderer: Arc<dyn MarkdownRenderer>,
    settle: SettleDetector,
    assets: AssetInliner,
}

impl DocumentRenderer {
    pub fn new(
        renderer: Arc<dyn MarkdownRenderer>,
        settle: SettleDetector,
        assets: AssetInliner,
    ) -> Self {
        Self {
            renderer,
            settle,
            assets,
        }
    }

    /// Render, transform and inline the assets of `request`. The returned tree
    /// is the preview root element with the note's blocks as children.
    pub async fn render_document(&self, request: &RenderRequest) -> Result<Element, RenderError> {
        let markdown = preprocess_markdown(&request.source_text, &request.options);
        let mut tree = self
            .settle
            .render(self.renderer.as_ref(), &markdown, &request.source_path)
            .await?;

        apply_structural_steps(&mut tree, &request.options);
        self.assets.inline_assets(&mut tree, &request.options).await;

        debug!(
            target = "application::pipeline",
            op = "render_document",
            source_path = %request.source_path,
            blocks = tree.children.len(),
            "document rendered"
        );
        Ok(tree)
    }
}
