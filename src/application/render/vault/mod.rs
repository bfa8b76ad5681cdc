//! Default renderer: comrak plus a markup pass that reproduces the live
//! preview's structure, populated into the container block by block.

mod callouts;
mod markup;

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use comrak::{
    Arena, format_html,
    nodes::{AstNode, NodeValue},
    options::Options,
    parse_document,
};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::trace;

use crate::{
    application::{
        dom::{Element, Node, parse_fragment},
        render::{
            container::{RenderContainer, RenderScope},
            types::{BlockContext, BlockPostProcessor, MarkdownRenderer, RenderError},
        },
    },
    domain::asset::vault_uri_prefix,
};

use self::{
    callouts::promote_callouts,
    markup::{LinkContext, normalize_markup},
};

pub use self::markup::BACKLINK_GLYPH;

const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "avif"];

/// `![[file.png]]` and `![[file.png|alt text]]` embeds.
static WIKI_EMBED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[\[([^\]|#]+)(?:#[^\]|]*)?(?:\|([^\]]*))?\]\]").expect("embed pattern is valid")
});

/// Markdown renderer for notes stored in a vault.
pub struct VaultRenderer {
    options: Options<'static>,
    vault_root: PathBuf,
    post_processors: Vec<Arc<dyn BlockPostProcessor>>,
}

impl VaultRenderer {
    pub fn new(vault_root: impl Into<PathBuf>) -> Self {
        Self {
            options: vault_options(),
            vault_root: vault_root.into(),
            post_processors: Vec::new(),
        }
    }

    /// Register a processor that runs on every rendered block.
    pub fn with_post_processor(mut self, processor: Arc<dyn BlockPostProcessor>) -> Self {
        self.post_processors.push(processor);
        self
    }

    /// Render `markdown` to normalised top-level blocks.
    pub fn render_blocks(
        &self,
        markdown: &str,
        source_path: &str,
    ) -> Result<Vec<Node>, RenderError> {
        let markdown = rewrite_embeds(markdown);
        let arena = Arena::new();
        let root = parse_document(&arena, &markdown, &self.options);
        let front_matter = take_front_matter(root);

        let mut html = String::new();
        format_html(root, &self.options, &mut html)
            .map_err(|err| RenderError::markdown(err.to_string()))?;

        let links = LinkContext::new(vault_uri_prefix(&self.vault_root), source_path);
        let html = normalize_markup(&html, &links)?;

        let mut body = Element::new("div").with_children(parse_fragment(&html));
        promote_callouts(&mut body);

        let mut blocks = Vec::with_capacity(body.children.len() + 1);
        if let Some(yaml) = front_matter {
            blocks.push(front_matter_block(yaml).into());
        }
        blocks.append(&mut body.children);
        Ok(blocks)
    }

    fn schedule_post_processing(
        &self,
        container: &RenderContainer,
        scope: &RenderScope,
        block: &Element,
        context: BlockContext,
    ) {
        for processor in &self.post_processors {
            let processor = Arc::clone(processor);
            let container = container.clone();
            let block = block.clone();
            let context = context.clone();
            scope.spawn(async move {
                let index = context.index;
                if let Some(replacement) = processor.process(block, context).await {
                    container.replace_block(index, replacement);
                }
            });
        }
    }
}

#[async_trait]
impl MarkdownRenderer for VaultRenderer {
    async fn render(
        &self,
        markdown: &str,
        container: &RenderContainer,
        source_path: &str,
        scope: &RenderScope,
    ) -> Result<(), RenderError> {
        let blocks = self.render_blocks(markdown, source_path)?;
        trace!(
            target = "application::render::vault",
            op = "render",
            source_path,
            blocks = blocks.len(),
            "rendered markdown blocks"
        );

        for block in blocks {
            let element = block.as_element().cloned();
            let index = container.append_block(block);
            if let Some(element) = element {
                let context = BlockContext {
                    source_path: source_path.to_string(),
                    index,
                };
                self.schedule_post_processing(container, scope, &element, context);
            }
            tokio::task::yield_now().await;
        }
        Ok(())
    }
}

fn vault_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.front_matter_delimiter = Some("---".to_string());
    ext.wikilinks_title_after_pipe = true;

    let render = &mut options.render;
    render.hardbreaks = true;
    render.tasklist_classes = true;
    render.r#unsafe = true;

    options
}

/// Convert image embeds into plain markdown images; other embeds are left alone.
fn rewrite_embeds(markdown: &str) -> std::borrow::Cow<'_, str> {
    WIKI_EMBED.replace_all(markdown, |caps: &Captures<'_>| {
        let target = caps[1].trim();
        let extension = target
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return caps[0].to_string();
        }
        let alt = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|alt| !alt.chars().all(|c| c.is_ascii_digit() || c == 'x'))
            .unwrap_or(target);
        format!("![{alt}](</{target}>)")
    })
}

fn take_front_matter<'a>(root: &'a AstNode<'a>) -> Option<String> {
    let first = root.first_child()?;
    let raw = match &first.data.borrow().value {
        NodeValue::FrontMatter(raw) => raw.clone(),
        _ => return None,
    };
    first.detach();
    Some(front_matter_body(&raw))
}

fn front_matter_body(raw: &str) -> String {
    let mut lines: Vec<&str> = raw.lines().collect();
    if lines.first().is_some_and(|line| line.trim() == "---") {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    if lines
        .last()
        .is_some_and(|line| matches!(line.trim(), "---" | "..."))
    {
        lines.pop();
    }
    lines.join("\n")
}

fn front_matter_block(yaml: String) -> Element {
    Element::new("pre")
        .with_attr("class", "frontmatter language-yaml")
        .with_attr("tabindex", "0")
        .with_child(
            Element::new("code")
                .with_attr("class", "language-yaml is-loaded")
                .with_text(yaml),
        )
}
