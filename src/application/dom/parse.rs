use html5ever::{local_name, parse_document, tendril::TendrilSink};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::{Attribute, Element, Node};

/// Parse an HTML fragment as body content.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let document = format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>");
    let dom = parse_document(RcDom::default(), Default::default()).one(document);

    find_body(&dom.document)
        .map(|body| body.children.borrow().iter().filter_map(convert).collect())
        .unwrap_or_default()
}

fn find_body(handle: &Handle) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if let NodeData::Element { name, .. } = &child.data {
            if name.local == local_name!("body") {
                return Some(child.clone());
            }
            if let Some(found) = find_body(child) {
                return Some(found);
            }
        }
    }
    None
}

fn convert(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => Some(Node::Element(Element {
            name: name.clone(),
            attrs: attrs
                .borrow()
                .iter()
                .map(|attr| Attribute {
                    name: attr.name.clone(),
                    value: attr.value.to_string(),
                })
                .collect(),
            children: handle.children.borrow().iter().filter_map(convert).collect(),
        })),
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Comment { contents } => Some(Node::Comment(contents.to_string())),
        _ => None,
    }
}
