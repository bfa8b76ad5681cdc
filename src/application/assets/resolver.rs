use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use futures::future::join_all;
use tracing::{debug, info};

use crate::{
    application::{
        dom::{Edit, Element, Node, to_xml},
        vault::VaultReader,
    },
    domain::{
        asset::{AssetReference, ImagePlan, mime_type_for, vault_uri_prefix},
        options::RenderOptions,
        theme::BASELINE_THEME,
    },
};

use super::{AssetError, RasterConverter};

const SVG_MIME: &str = "image/svg+xml";

/// Replaces image sources and inline vector graphics with embedded data.
///
/// Every resolution of one pass is issued at once and joined; the tree is only
/// mutated after the join, in document order.
pub struct AssetInliner {
    vault: Arc<dyn VaultReader>,
    raster: RasterConverter,
    vault_prefix: String,
}

impl AssetInliner {
    pub fn new(vault: Arc<dyn VaultReader>, raster: RasterConverter) -> Self {
        let vault_prefix = vault_uri_prefix(vault.base_path());
        Self {
            vault,
            raster,
            vault_prefix,
        }
    }

    /// Inline every `img` source below `root`, then rasterize inline `svg`
    /// elements when bitmap conversion is enabled.
    pub async fn inline_assets(&self, root: &mut Element, options: &RenderOptions) {
        self.embed_images(root, options).await;
        if options.convert_svg_to_bitmap {
            self.render_svgs(root).await;
        }
    }

    pub async fn embed_images(&self, root: &mut Element, options: &RenderOptions) {
        let sources: Vec<String> = root
            .descendants()
            .filter(|el| el.is("img"))
            .filter_map(|el| el.attr("src"))
            .filter(|src| !src.is_empty())
            .map(str::to_string)
            .collect();
        if sources.is_empty() {
            return;
        }

        let resolutions = join_all(
            sources
                .iter()
                .map(|source| self.resolve_image(source, options)),
        )
        .await;

        let mut replacements = resolutions.into_iter();
        let mut replaced = 0usize;
        root.for_each_mut(&mut |el| {
            if !el.is("img") || el.attr("src").is_none_or(str::is_empty) {
                return;
            }
            if let Some(Some(src)) = replacements.next() {
                el.set_attr("src", src);
                replaced += 1;
            }
        });

        debug!(
            target = "application::assets::resolver",
            op = "embed_images",
            images = sources.len(),
            replaced,
            "image sources inlined"
        );
    }

    /// New source for `source`, or `None` to leave the image as it is.
    async fn resolve_image(&self, source: &str, options: &RenderOptions) -> Option<String> {
        let reference = AssetReference::classify(source, &self.vault_prefix);
        let plan = ImagePlan::for_reference(
            &reference,
            options.convert_svg_to_bitmap,
            options.embed_external_links,
        );
        match plan {
            ImagePlan::Keep => None,
            ImagePlan::Rasterize => Some(self.raster.rasterize(source).await.into_src()),
            ImagePlan::ReadVault { path } => match self.read_vault_image(&path).await {
                Ok(data_uri)
                    if options.convert_svg_to_bitmap && mime_type_for(&path) == SVG_MIME =>
                {
                    Some(self.raster.rasterize(&data_uri).await.into_src())
                }
                Ok(data_uri) => Some(data_uri),
                Err(error) => {
                    info!(
                        target = "application::assets::resolver",
                        op = "embed_image",
                        result = "unresolved",
                        path = %path,
                        error = %error,
                        "leaving image source unchanged"
                    );
                    None
                }
            },
        }
    }

    async fn read_vault_image(&self, path: &str) -> Result<String, AssetError> {
        let mime = mime_type_for(path);
        let bytes = self.vault.read_binary(path).await?;
        Ok(format!("data:{mime};base64,{}", STANDARD.encode(&bytes)))
    }

    /// Replace each outermost `svg` with an `img` holding a bitmap of it.
    pub async fn render_svgs(&self, root: &mut Element) {
        let mut graphics = Vec::new();
        collect_svgs(root, &mut graphics);
        if graphics.is_empty() {
            return;
        }

        let rasterized = join_all(graphics.iter().map(|svg| async move {
            let data_uri = svg_data_uri(svg);
            self.raster.rasterize(&data_uri).await.into_src()
        }))
        .await;

        let mut next = graphics.into_iter().zip(rasterized);
        root.edit(&mut |el| {
            if !el.is("svg") {
                return Edit::Keep;
            }
            match next.next() {
                Some((svg, src)) => {
                    let mut img = Element::new("img").with_attr("src", src);
                    if let Some(style) = svg.attr("style") {
                        img.set_attr("style", style);
                    }
                    Edit::Replace(vec![img.into()])
                }
                None => Edit::Keep,
            }
        });

        debug!(
            target = "application::assets::resolver",
            op = "render_svgs",
            "inline vector graphics rasterized"
        );
    }
}

/// Outermost `svg` elements in document order.
fn collect_svgs(element: &Element, out: &mut Vec<Element>) {
    for child in element.element_children() {
        if child.is("svg") {
            out.push(child.clone());
        } else {
            collect_svgs(child, out);
        }
    }
}

/// Serialise `svg` with the baseline theme added to its first style sheet.
fn svg_data_uri(svg: &Element) -> String {
    let mut themed = svg.clone();
    match themed.find_mut(&|el: &Element| el.is("style")) {
        Some(style) => match style.children.last_mut() {
            Some(Node::Text(css)) => css.push_str(BASELINE_THEME),
            _ => style.children.push(Node::text(BASELINE_THEME)),
        },
        None => themed
            .children
            .push(Element::new_svg("style").with_text(BASELINE_THEME).into()),
    }
    let xml = to_xml(&themed);
    format!("data:{SVG_MIME};base64,{}", STANDARD.encode(xml))
}
