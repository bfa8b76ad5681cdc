//! Export options controlling which rewrites the copy pipeline applies.

use std::{fmt, str::FromStr};

use serde::Deserialize;

use super::{error::DomainError, theme::DEFAULT_STYLESHEET};

/// How footnote references and the footnote section survive the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FootnoteHandling {
    /// Remove references, their markers and the footnotes section.
    RemoveAll,
    /// Keep everything, links included.
    LeaveLink,
    /// Keep reference labels as plain text and drop back-links.
    #[default]
    RemoveLink,
    /// Reserved for moving footnote text into a title attribute; currently inert.
    TitleAttribute,
}

impl FootnoteHandling {
    pub fn as_str(self) -> &'static str {
        match self {
            FootnoteHandling::RemoveAll => "remove-all",
            FootnoteHandling::LeaveLink => "leave-link",
            FootnoteHandling::RemoveLink => "remove-link",
            FootnoteHandling::TitleAttribute => "title-attribute",
        }
    }
}

impl fmt::Display for FootnoteHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FootnoteHandling {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "remove-all" => Ok(FootnoteHandling::RemoveAll),
            "leave-link" => Ok(FootnoteHandling::LeaveLink),
            "remove-link" => Ok(FootnoteHandling::RemoveLink),
            "title-attribute" => Ok(FootnoteHandling::TitleAttribute),
            other => Err(DomainError::validation(format!(
                "unknown footnote handling `{other}` (expected remove-all, leave-link, remove-link or title-attribute)"
            ))),
        }
    }
}

/// Options applied to a single copy. Missing keys fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub remove_front_matter: bool,
    /// Accepted for compatibility with stored preferences; no rewrite reads it.
    pub remove_link_text: bool,
    pub convert_svg_to_bitmap: bool,
    pub format_as_tables: bool,
    pub embed_external_links: bool,
    pub remove_dataview_metadata_lines: bool,
    pub footnote_handling: FootnoteHandling,
    pub use_custom_stylesheet: bool,
    pub style_sheet: String,
    pub bare_html_only: bool,
    pub file_name_as_header: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            remove_front_matter: true,
            remove_link_text: false,
            convert_svg_to_bitmap: true,
            format_as_tables: false,
            embed_external_links: false,
            remove_dataview_metadata_lines: false,
            footnote_handling: FootnoteHandling::RemoveLink,
            use_custom_stylesheet: false,
            style_sheet: DEFAULT_STYLESHEET.to_string(),
            bare_html_only: false,
            file_name_as_header: false,
        }
    }
}

impl RenderOptions {
    /// Stylesheet placed after the baseline theme in the exported document.
    pub fn selected_stylesheet(&self) -> &str {
        if self.use_custom_stylesheet {
            &self.style_sheet
        } else {
            DEFAULT_STYLESHEET
        }
    }
}
