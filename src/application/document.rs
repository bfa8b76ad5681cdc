//! Final HTML document built around a transformed fragment.

use crate::{
    application::dom::Element,
    domain::{file::VaultFile, options::RenderOptions, theme::BASELINE_THEME},
};

/// Wrap `fragment` into a standalone document titled after `file`.
///
/// With `bare_html_only` the fragment is returned on its own. A file-name
/// heading is only added when the whole note is copied.
pub fn assemble_document(
    fragment: &str,
    file: &VaultFile,
    is_full_document: bool,
    options: &RenderOptions,
) -> String {
    let title = file.title();
    let body = if options.file_name_as_header && is_full_document {
        format!("{}\n{fragment}", Element::new("h1").with_text(title).outer_html())
    } else {
        fragment.to_string()
    };

    if options.bare_html_only {
        return body;
    }
    document_shell(
        &escape_text(title),
        BASELINE_THEME,
        options.selected_stylesheet(),
        &body,
    )
}

fn document_shell(title: &str, theme: &str, stylesheet: &str, body: &str) -> String {
    format!(
        "<html>\n<head>\n  <title>{title}</title>\n  <style>\n    {theme}\n    {stylesheet}\n  </style>\n</head>\n<body>\n{body}\n</body>\n</html>"
    )
}

/// Escape text the way the serializer escapes text nodes.
fn escape_text(text: &str) -> String {
    Element::new("span").with_text(text).inner_html()
}
