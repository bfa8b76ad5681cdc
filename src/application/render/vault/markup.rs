use lol_html::{RewriteStrSettings, element, html_content::ContentType, rewrite_str};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::application::render::types::RenderError;

pub const BACKLINK_GLYPH: &str = "\u{21a9}\u{fe0e}";
const COLLAPSE_INDICATOR: &str =
    r#"<div class="heading-collapse-indicator collapse-indicator collapse-icon"></div>"#;
const COPY_BUTTON: &str = r#"<button class="copy-code-button">Copy</button>"#;

/// Characters escaped when a vault path becomes part of a resource URI.
const RESOURCE_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Where relative references of the note being rendered resolve.
#[derive(Debug, Clone)]
pub(super) struct LinkContext {
    /// Vault resource URI prefix, without a trailing slash.
    pub uri_prefix: String,
    /// Vault-relative directory of the note, empty at the vault root.
    pub note_dir: String,
}

impl LinkContext {
    pub fn new(uri_prefix: String, source_path: &str) -> Self {
        let note_dir = source_path
            .rsplit_once('/')
            .map(|(dir, _)| dir.to_string())
            .unwrap_or_default();
        Self {
            uri_prefix: uri_prefix.trim_end_matches('/').to_string(),
            note_dir,
        }
    }

    /// Vault resource URI for a relative image reference, `None` when the
    /// reference is absolute or escapes the vault.
    pub fn resource_uri(&self, src: &str) -> Option<String> {
        if !is_relative_reference(src) {
            return None;
        }
        let decoded = percent_decode_str(src).decode_utf8_lossy();
        let path = match decoded.strip_prefix('/') {
            Some(from_root) => normalize_path("", from_root)?,
            None => normalize_path(&self.note_dir, &decoded)?,
        };
        Some(format!(
            "{}/{}",
            self.uri_prefix,
            utf8_percent_encode(&path, RESOURCE_PATH)
        ))
    }
}

fn is_relative_reference(src: &str) -> bool {
    !src.is_empty()
        && !src.starts_with('#')
        && matches!(url::Url::parse(src), Err(url::ParseError::RelativeUrlWithoutBase))
}

/// Join `reference` onto `base` and resolve `.` and `..` segments.
fn normalize_path(base: &str, reference: &str) -> Option<String> {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    (!segments.is_empty()).then(|| segments.join("/"))
}

fn append_class(existing: Option<String>, class: &str) -> String {
    match existing {
        Some(classes) if classes.split_ascii_whitespace().any(|c| c == class) => classes,
        Some(classes) if !classes.trim().is_empty() => format!("{} {class}", classes.trim()),
        _ => class.to_string(),
    }
}

/// Rewrite comrak's output into the markup the live preview produces.
pub(super) fn normalize_markup(html: &str, links: &LinkContext) -> Result<String, RenderError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("a[data-wikilink]", |el| {
                    el.remove_attribute("data-wikilink");
                    if let Some(href) = el.get_attribute("href") {
                        el.set_attribute("data-href", &href)?;
                    }
                    let classes = append_class(el.get_attribute("class"), "internal-link");
                    el.set_attribute("class", &classes)?;
                    Ok(())
                }),
                element!("a[data-footnote-ref]", |el| {
                    let classes = append_class(el.get_attribute("class"), "footnote-link");
                    el.set_attribute("class", &classes)?;
                    Ok(())
                }),
                element!("a.footnote-backref", |el| {
                    let classes = append_class(el.get_attribute("class"), "footnote-link");
                    el.set_attribute("class", &classes)?;
                    el.set_inner_content(BACKLINK_GLYPH, ContentType::Text);
                    Ok(())
                }),
                element!("input[type=checkbox]", |el| {
                    el.remove_attribute("disabled");
                    el.set_attribute(
                        "class",
                        &append_class(el.get_attribute("class"), "task-list-item-checkbox"),
                    )?;
                    Ok(())
                }),
                element!("h1, h2, h3, h4, h5, h6", |el| {
                    el.prepend(COLLAPSE_INDICATOR, ContentType::Html);
                    Ok(())
                }),
                element!("pre", |el| {
                    el.append(COPY_BUTTON, ContentType::Html);
                    Ok(())
                }),
                element!("img[src]", |el| {
                    if let Some(uri) = el
                        .get_attribute("src")
                        .and_then(|src| links.resource_uri(&src))
                    {
                        el.set_attribute("src", &uri)?;
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::markup(err.to_string()))
}
