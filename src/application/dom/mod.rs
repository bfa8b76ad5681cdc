//! Owned element tree used by the copy pipeline.
//!
//! Rendered markup is parsed once with html5ever into plain owned nodes so a
//! tree can be cloned, moved across tasks and rewritten in place without the
//! reference-counted handles of a live DOM.

mod parse;
mod serialize;
mod xml;

use html5ever::{LocalName, QualName, ns};

pub use parse::parse_fragment;
pub use serialize::to_html;
pub use xml::to_xml;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QualName,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// Decision returned by the callback of [`Element::edit`].
#[derive(Debug)]
pub enum Edit {
    /// Keep the element and continue with its children.
    Keep,
    /// Drop the element and everything below it.
    Remove,
    /// Put these nodes where the element was; they are not visited.
    Replace(Vec<Node>),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Node::Text(text) => out.push_str(text),
            Node::Comment(_) => {}
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Element {
    /// New element in the HTML namespace.
    pub fn new(tag: &str) -> Self {
        Self::with_name(QualName::new(None, ns!(html), LocalName::from(tag)))
    }

    /// New element in the SVG namespace.
    pub fn new_svg(tag: &str) -> Self {
        Self::with_name(QualName::new(None, ns!(svg), LocalName::from(tag)))
    }

    pub fn with_name(name: QualName) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.name.local
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag() == tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name.ns == ns!() && &*attr.name.local == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|attr| attr.name.ns == ns!() && &*attr.name.local == name)
        {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(name)),
                value,
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self
            .attrs
            .iter()
            .position(|attr| attr.name.ns == ns!() && &*attr.name.local == name)?;
        Some(self.attrs.remove(index).value)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attr("class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr("class", classes);
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    pub fn inner_html(&self) -> String {
        to_html(&self.children)
    }

    pub fn outer_html(&self) -> String {
        serialize::outer_html(self)
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Every element below this one in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&Node> = self.children.iter().collect();
        stack.reverse();
        Descendants { stack }
    }

    pub fn find(&self, predicate: impl Fn(&Element) -> bool) -> Option<&Element> {
        self.descendants().find(|element| predicate(element))
    }

    pub fn find_mut<P>(&mut self, predicate: &P) -> Option<&mut Element>
    where
        P: Fn(&Element) -> bool,
    {
        for child in self.children.iter_mut() {
            if let Node::Element(element) = child {
                if predicate(element) {
                    return Some(element);
                }
                if let Some(found) = element.find_mut(predicate) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Visit every descendant element in document order.
    pub fn for_each_mut<F>(&mut self, visit: &mut F)
    where
        F: FnMut(&mut Element),
    {
        for child in self.children.iter_mut() {
            if let Node::Element(element) = child {
                visit(element);
                element.for_each_mut(visit);
            }
        }
    }

    /// Rewrite descendants in document order. Removed and replaced subtrees are
    /// not visited, so a rewrite never sees its own output.
    pub fn edit<F>(&mut self, callback: &mut F)
    where
        F: FnMut(&mut Element) -> Edit,
    {
        let children = std::mem::take(&mut self.children);
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Node::Element(mut element) => match callback(&mut element) {
                    Edit::Keep => {
                        element.edit(callback);
                        kept.push(Node::Element(element));
                    }
                    Edit::Remove => {}
                    Edit::Replace(nodes) => kept.extend(nodes),
                },
                other => kept.push(other),
            }
        }
        self.children = kept;
    }
}

/// Pre-order iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if let Node::Element(element) = node {
                self.stack.extend(element.children.iter().rev());
                return Some(element);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("div")
            .with_child(
                Element::new("p")
                    .with_text("one ")
                    .with_child(Element::new("em").with_text("two")),
            )
            .with_child(Element::new("span").with_class("badge").with_text("3"))
    }

    #[test]
    fn descendants_walk_in_document_order() {
        let tags: Vec<_> = sample().descendants().map(|e| e.tag().to_string()).collect();
        assert_eq!(tags, ["p", "em", "span"]);
    }

    #[test]
    fn text_content_concatenates_text_nodes() {
        assert_eq!(sample().text_content(), "one two3");
    }

    #[test]
    fn class_helpers_manage_token_list() {
        let mut element = Element::new("a").with_class("internal-link");
        assert!(element.has_class("internal-link"));
        assert!(!element.has_class("internal"));
        element.add_class("footnote-link");
        element.add_class("footnote-link");
        assert_eq!(element.attr("class"), Some("internal-link footnote-link"));
    }

    #[test]
    fn attributes_can_be_replaced_and_removed() {
        let mut element = Element::new("img").with_attr("src", "a.png");
        element.set_attr("src", "b.png");
        assert_eq!(element.attr("src"), Some("b.png"));
        assert_eq!(element.remove_attr("src").as_deref(), Some("b.png"));
        assert_eq!(element.attr("src"), None);
        assert_eq!(element.remove_attr("src"), None);
    }

    #[test]
    fn edit_does_not_revisit_replacements() {
        let mut root = Element::new("div")
            .with_child(Element::new("b").with_child(Element::new("b").with_text("x")));
        let mut visits = 0;
        root.edit(&mut |element| {
            if element.is("b") {
                visits += 1;
                Edit::Replace(vec![Element::new("b").with_text("y").into()])
            } else {
                Edit::Keep
            }
        });
        assert_eq!(visits, 1);
        assert_eq!(root.inner_html(), "<b>y</b>");
    }

    #[test]
    fn edit_removes_subtrees() {
        let mut root = sample();
        root.edit(&mut |element| {
            if element.has_class("badge") {
                Edit::Remove
            } else {
                Edit::Keep
            }
        });
        assert_eq!(root.inner_html(), "<p>one <em>two</em></p>");
    }

    #[test]
    fn find_mut_returns_first_match() {
        let mut root = sample();
        if let Some(em) = root.find_mut(&|element: &Element| element.is("em")) {
            em.set_attr("data-hit", "1");
        }
        assert!(root.find(|element| element.attr("data-hit") == Some("1")).is_some());
    }
}
