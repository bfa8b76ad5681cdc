use std::io;

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};

use super::{Element, Node};

/// Serialise nodes as HTML using the html5ever serializer.
pub fn to_html(nodes: &[Node]) -> String {
    write_html(&Fragment(nodes), TraversalScope::ChildrenOnly(None))
}

pub(super) fn outer_html(element: &Element) -> String {
    write_html(element, TraversalScope::IncludeNode)
}

fn write_html<T: Serialize>(node: &T, traversal_scope: TraversalScope) -> String {
    let mut buf = Vec::new();
    let opts = SerializeOpts {
        traversal_scope,
        ..SerializeOpts::default()
    };
    // Writes into a Vec cannot fail.
    let _ = serialize(&mut buf, node, opts);
    String::from_utf8(buf)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

struct Fragment<'a>(&'a [Node]);

impl Serialize for Fragment<'_> {
    fn serialize<S>(&self, serializer: &mut S, _traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        for node in self.0 {
            node.serialize(serializer, TraversalScope::IncludeNode)?;
        }
        Ok(())
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match self {
            Node::Element(element) => element.serialize(serializer, traversal_scope),
            Node::Text(text) => serializer.write_text(text),
            Node::Comment(text) => serializer.write_comment(text),
        }
    }
}

impl Serialize for Element {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let include_node = matches!(traversal_scope, TraversalScope::IncludeNode);
        if include_node {
            serializer.start_elem(
                self.name.clone(),
                self.attrs.iter().map(|attr| (&attr.name, attr.value.as_str())),
            )?;
        }
        for child in &self.children {
            child.serialize(serializer, TraversalScope::IncludeNode)?;
        }
        if include_node {
            serializer.end_elem(self.name.clone())?;
        }
        Ok(())
    }
}
