use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::options::RenderOptions;

/// Inline metadata lines such as `status:: draft`.
static DATAVIEW_METADATA_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[^ \t:#`<>][^:#`<>]+::.*$").expect("dataview metadata pattern is valid")
});

/// Markdown rewrites applied before the note reaches the renderer.
pub fn preprocess_markdown<'a>(markdown: &'a str, options: &RenderOptions) -> Cow<'a, str> {
    if options.remove_dataview_metadata_lines {
        DATAVIEW_METADATA_LINE.replace_all(markdown, "")
    } else {
        Cow::Borrowed(markdown)
    }
}
