//! Structural clean-up of a settled render before assets are inlined.
//!
//! Steps run in a fixed order over an exclusively owned tree. Each one is
//! total: a missing child or attribute means there is nothing to do.

use tracing::debug;

use crate::{
    application::{
        dom::{Edit, Element, Node},
        render::BACKLINK_GLYPH,
    },
    domain::options::{FootnoteHandling, RenderOptions},
};

/// Apply every synchronous transformation step to `root`.
pub fn apply_structural_steps(root: &mut Element, options: &RenderOptions) {
    strip_root_style(root);
    if options.remove_front_matter {
        remove_front_matter(root);
    }
    replace_internal_links(root);
    make_checkboxes_read_only(root);
    remove_collapse_indicators(root);
    remove_buttons(root);
    remove_backlink_counters(root);

    if options.format_as_tables {
        code_blocks_to_tables(root);
        callouts_to_tables(root);
    }

    match options.footnote_handling {
        FootnoteHandling::RemoveAll => remove_all_footnotes(root),
        FootnoteHandling::RemoveLink => remove_footnote_links(root),
        // TitleAttribute is accepted but not implemented.
        FootnoteHandling::LeaveLink | FootnoteHandling::TitleAttribute => {}
    }

    debug!(
        target = "application::transform",
        op = "structural_steps",
        format_as_tables = options.format_as_tables,
        footnotes = options.footnote_handling.as_str(),
        blocks = root.children.len(),
        "structural steps applied"
    );
}

fn strip_root_style(root: &mut Element) {
    root.remove_attr("style");
}

fn remove_front_matter(root: &mut Element) {
    remove_where(root, |el| {
        el.has_class("frontmatter") || el.has_class("frontmatter-container")
    });
}

fn replace_internal_links(root: &mut Element) {
    root.edit(&mut |el| {
        if el.is("a") && el.has_class("internal-link") {
            let span = Element::new("span")
                .with_class("internal-link")
                .with_text(el.text_content());
            Edit::Replace(vec![span.into()])
        } else {
            Edit::Keep
        }
    });
}

fn make_checkboxes_read_only(root: &mut Element) {
    root.for_each_mut(&mut |el| {
        if el.is("input")
            && el
                .attr("type")
                .is_some_and(|kind| kind.eq_ignore_ascii_case("checkbox"))
        {
            el.set_attr("disabled", "disabled");
        }
    });
}

fn remove_collapse_indicators(root: &mut Element) {
    remove_where(root, |el| el.has_class("collapse-indicator"));
}

fn remove_buttons(root: &mut Element) {
    remove_where(root, |el| el.is("button"));
}

/// Reference counters a backlink plugin injects next to links and headings.
fn remove_backlink_counters(root: &mut Element) {
    remove_where(root, |el| el.has_class("snw-reference"));
}

fn code_blocks_to_tables(root: &mut Element) {
    root.edit(&mut |el| {
        if !el.is("pre") {
            return Edit::Keep;
        }
        let Some(code) = el.find(|child| child.is("code")) else {
            return Edit::Keep;
        };
        let mut children = code.children.clone();
        trim_trailing_newlines(&mut children);

        let table = Element::new("table").with_class("source-table").with_child(
            Element::new("tr").with_child(
                Element::new("td").with_child(Element::new("pre").with_children(children)),
            ),
        );
        Edit::Replace(vec![table.into()])
    });
}

fn callouts_to_tables(root: &mut Element) {
    root.edit(&mut |el| {
        if !el.has_class("callout") {
            return Edit::Keep;
        }
        let kind = el.attr("data-callout").unwrap_or("quote").to_string();

        let mut head = Element::new("td").with_class("callout-title");
        if let Some(title) = el.find(|child| child.has_class("callout-title-inner")) {
            head.children
                .push(Element::new("span").with_children(title.children.clone()).into());
        }

        let mut table = Element::new("table")
            .with_attr("class", "callout-table callout")
            .with_attr("data-callout", kind)
            .with_child(Element::new("tr").with_child(head));
        if let Some(content) = el.find(|child| child.has_class("callout-content")) {
            table.children.push(
                Element::new("tr")
                    .with_child(Element::new("td").with_children(content.children.clone()))
                    .into(),
            );
        }
        Edit::Replace(vec![table.into()])
    });
}

/// Drop the footnotes section and every reference marker pointing into it.
fn remove_all_footnotes(root: &mut Element) {
    remove_where(root, |el| el.is("section") && el.has_class("footnotes"));
    // A marker is the element wrapping a footnote link, usually a `sup`.
    remove_where(root, |el| {
        el.element_children().any(|child| child.has_class("footnote-link"))
    });
    remove_where(root, |el| el.has_class("footnote-link"));
}

/// Keep footnote labels as plain text and drop the back-links.
fn remove_footnote_links(root: &mut Element) {
    root.edit(&mut |el| {
        if !el.has_class("footnote-link") {
            return Edit::Keep;
        }
        let label = el.text_content();
        if label == BACKLINK_GLYPH {
            Edit::Remove
        } else {
            let span = Element::new("span").with_class("footnote-link").with_text(label);
            Edit::Replace(vec![span.into()])
        }
    });
}

fn remove_where(root: &mut Element, predicate: impl Fn(&Element) -> bool) {
    root.edit(&mut |el| {
        if predicate(el) {
            Edit::Remove
        } else {
            Edit::Keep
        }
    });
}

fn trim_trailing_newlines(children: &mut Vec<Node>) {
    while let Some(Node::Text(text)) = children.last_mut() {
        let trimmed = text.trim_end_matches('\n');
        if trimmed.is_empty() {
            children.pop();
        } else {
            let keep = trimmed.len();
            text.truncate(keep);
            break;
        }
    }
}
