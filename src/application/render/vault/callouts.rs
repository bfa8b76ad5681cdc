//! `> [!type] Title` block quotes rendered as callout boxes.

use crate::application::dom::{Edit, Element, Node};

struct Marker {
    kind: String,
    fold: &'static str,
}

/// Replace callout block quotes below `root` with callout markup.
pub(super) fn promote_callouts(root: &mut Element) {
    root.edit(&mut |element| {
        if !element.is("blockquote") {
            return Edit::Keep;
        }
        match build_callout(element) {
            Some(callout) => Edit::Replace(vec![callout.into()]),
            None => Edit::Keep,
        }
    });
}

fn build_callout(quote: &mut Element) -> Option<Element> {
    let first_index = quote
        .children
        .iter()
        .position(|child| !matches!(child, Node::Text(text) if text.trim().is_empty()))?;
    let first = quote.children[first_index].as_element()?;
    if !first.is("p") {
        return None;
    }
    let Some(Node::Text(lead)) = first.children.first() else {
        return None;
    };
    let (marker, after_marker) = parse_marker(lead)?;

    let mut children = std::mem::take(&mut quote.children);
    let paragraph = match children.remove(first_index) {
        Node::Element(paragraph) => paragraph,
        _ => return None,
    };
    let rest = children.split_off(first_index);

    let mut title = Vec::new();
    let mut body = Vec::new();
    let mut in_body = false;
    let mut inline = paragraph.children.into_iter();
    inline.next();
    let lead_nodes = std::iter::once(Node::Text(after_marker)).chain(inline);
    for node in lead_nodes {
        if in_body {
            body.push(node);
            continue;
        }
        match node {
            Node::Text(text) => match text.split_once('\n') {
                Some((head, tail)) => {
                    push_text(&mut title, head);
                    push_text(&mut body, tail.trim_start());
                    in_body = true;
                }
                None => push_text(&mut title, &text),
            },
            Node::Element(element) if element.is("br") => in_body = true,
            other => title.push(other),
        }
    }
    trim_leading_whitespace(&mut body);
    trim_title(&mut title);
    if title.is_empty() {
        title.push(Node::text(default_title(&marker.kind)));
    }

    let mut content = Element::new("div").with_class("callout-content");
    if !body.is_empty() {
        content.children.push(Element::new("p").with_children(body).into());
    }
    content.children.extend(rest);
    promote_callouts(&mut content);

    let title = Element::new("div")
        .with_class("callout-title")
        .with_child(Element::new("div").with_class("callout-icon"))
        .with_child(
            Element::new("div")
                .with_class("callout-title-inner")
                .with_children(title),
        );

    Some(
        Element::new("div")
            .with_attr("data-callout-metadata", "")
            .with_attr("data-callout-fold", marker.fold)
            .with_attr("data-callout", marker.kind)
            .with_class("callout")
            .with_child(title)
            .with_child(content),
    )
}

/// Parse `[!type]` with an optional `+`/`-` fold flag; returns the marker
/// and the text that follows it.
fn parse_marker(text: &str) -> Option<(Marker, String)> {
    let rest = text.trim_start().strip_prefix("[!")?;
    let close = rest.find(']')?;
    let kind = &rest[..close];
    if kind.is_empty()
        || !kind
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    let after = &rest[close + 1..];
    let (fold, after) = match after.chars().next() {
        Some('+') => ("+", &after[1..]),
        Some('-') => ("-", &after[1..]),
        _ => ("", after),
    };
    if !after.is_empty() && !after.starts_with([' ', '\t', '\n']) {
        return None;
    }
    let marker = Marker {
        kind: kind.to_lowercase(),
        fold,
    };
    Some((marker, after.trim_start_matches([' ', '\t']).to_string()))
}

fn default_title(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if !text.is_empty() {
        nodes.push(Node::text(text));
    }
}

fn trim_leading_whitespace(nodes: &mut Vec<Node>) {
    while let Some(Node::Text(text)) = nodes.first_mut() {
        let trimmed = text.trim_start();
        if trimmed.is_empty() {
            nodes.remove(0);
        } else {
            *text = trimmed.to_string();
            break;
        }
    }
}

fn trim_title(nodes: &mut Vec<Node>) {
    trim_leading_whitespace(nodes);
    while let Some(Node::Text(text)) = nodes.last_mut() {
        let trimmed = text.trim_end();
        if trimmed.is_empty() {
            nodes.pop();
        } else {
            *text = trimmed.to_string();
            break;
        }
    }
}
