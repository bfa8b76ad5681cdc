use html5ever::ns;

use super::{Element, Node};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// Serialise an element as standalone XML, declaring the SVG and XLink
/// namespaces on the root when the tree relies on them.
pub fn to_xml(root: &Element) -> String {
    let mut out = String::new();
    write_element(root, true, &mut out);
    out
}

fn write_element(element: &Element, is_root: bool, out: &mut String) {
    let name = qualified_name(element.name.prefix.as_deref(), &element.name.local);
    out.push('<');
    out.push_str(&name);

    if is_root {
        if !declares(element, None) {
            push_attr(out, "xmlns", SVG_NAMESPACE);
        }
        if uses_xlink(element) && !declares(element, Some("xlink")) {
            push_attr(out, "xmlns:xlink", XLINK_NAMESPACE);
        }
    }

    for attr in &element.attrs {
        let attr_name = qualified_name(attr.name.prefix.as_deref(), &attr.name.local);
        push_attr(out, &attr_name, &attr.value);
    }

    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(child, false, out),
            Node::Text(text) => push_escaped(out, text, false),
            Node::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
    out.push_str("</");
    out.push_str(&name);
    out.push('>');
}

fn qualified_name(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

/// Whether `element` declares the default namespace (`None`) or `xmlns:{prefix}`.
/// Parsed declarations live in the xmlns namespace with an empty or absent
/// prefix for the default namespace.
fn declares(element: &Element, prefix: Option<&str>) -> bool {
    element.attrs.iter().any(|attr| {
        let name = &attr.name;
        let in_xmlns = name.ns == ns!(xmlns);
        match prefix {
            None => {
                &*name.local == "xmlns"
                    && (in_xmlns || name.prefix.as_deref().unwrap_or("").is_empty())
            }
            Some(prefix) => {
                &*name.local == prefix && (in_xmlns || name.prefix.as_deref() == Some("xmlns"))
            }
        }
    })
}

fn uses_xlink(element: &Element) -> bool {
    let own = element
        .attrs
        .iter()
        .any(|attr| attr.name.prefix.as_deref() == Some("xlink"));
    own || element.descendants().any(|child| {
        child
            .attrs
            .iter()
            .any(|attr| attr.name.prefix.as_deref() == Some("xlink"))
    })
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    push_escaped(out, value, true);
    out.push('"');
}

fn push_escaped(out: &mut String, value: &str, in_attribute: bool) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            '\n' if in_attribute => out.push_str("&#10;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dom::parse_fragment;

    fn first_svg(html: &str) -> Element {
        parse_fragment(html)
            .into_iter()
            .find_map(|node| match node {
                Node::Element(element) if element.is("svg") => Some(element),
                _ => None,
            })
            .expect("svg element")
    }

    #[test]
    fn adds_missing_svg_namespace() {
        let svg = first_svg(r#"<svg width="4" height="2"><rect width="4" height="2"></rect></svg>"#);
        assert_eq!(
            to_xml(&svg),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><rect width="4" height="2"/></svg>"#
        );
    }

    #[test]
    fn keeps_existing_namespace_declaration() {
        let svg = first_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><g></g></svg>"#,
        );
        assert_eq!(
            to_xml(&svg),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><g/></svg>"#
        );
    }

    #[test]
    fn keeps_existing_xlink_declaration() {
        let svg = first_svg(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
            r##"<use xlink:href="#a"></use></svg>"##,
        ));
        let xml = to_xml(&svg);
        assert_eq!(xml.matches("xmlns=").count(), 1);
        assert_eq!(xml.matches("xmlns:xlink=").count(), 1);
    }

    #[test]
    fn declares_xlink_when_used() {
        let svg = first_svg(r##"<svg><use xlink:href="#a"></use></svg>"##);
        let xml = to_xml(&svg);
        assert!(xml.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
        assert!(xml.contains(r##"<use xlink:href="#a"/>"##));
    }

    #[test]
    fn escapes_style_text() {
        let svg = first_svg("<svg><style>a > b { fill: red; }</style></svg>");
        assert!(to_xml(&svg).contains("<style>a &gt; b { fill: red; }</style>"));
    }
}
