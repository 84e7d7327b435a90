//! Serialization views over a [`Document`].
//!
//! Two views are offered: `to_raw_xml` reproduces the document's structure
//! exactly as parsed (attribute order, prefixes, whitespace and comments
//! intact), while `to_pretty_xml` re-indents the tree for human reading.
//! The pretty view is semantically equivalent but makes no byte-identity
//! promise.

use super::dom::{Document, NodeId, NodeKind};

/// Indent step for the pretty view.
const INDENT: &str = "  ";

// =============================================================================
// Raw view
// =============================================================================

/// Serialize the document exactly as structured: no added or removed
/// whitespace, attributes in stored order.
pub fn to_raw_xml(doc: &Document) -> String {
    let mut out = String::new();
    write_declaration(doc, &mut out);
    write_node_raw(doc, doc.root(), &mut out);
    out
}

fn write_node_raw(doc: &Document, id: NodeId, out: &mut String) {
    match &doc.node(id).kind {
        NodeKind::Element(e) => {
            out.push('<');
            out.push_str(&e.name.to_string());
            for attr in &e.attributes {
                out.push(' ');
                out.push_str(&attr.name.to_string());
                out.push_str("=\"");
                out.push_str(&escape_attr(&attr.value));
                out.push('"');
            }
            if e.children.is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                for &child in &e.children {
                    write_node_raw(doc, child, out);
                }
                out.push_str("</");
                out.push_str(&e.name.to_string());
                out.push('>');
            }
        }
        NodeKind::Text(t) => out.push_str(&escape_text(t)),
        NodeKind::CData(t) => {
            out.push_str("<![CDATA[");
            out.push_str(t);
            out.push_str("]]>");
        }
        NodeKind::Comment(t) => {
            out.push_str("<!--");
            out.push_str(t);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction { target, content } => {
            out.push_str("<?");
            out.push_str(target);
            if !content.is_empty() {
                out.push(' ');
                out.push_str(content);
            }
            out.push_str("?>");
        }
    }
}

// =============================================================================
// Pretty view
// =============================================================================

/// Serialize the document with indentation, one element per line.
///
/// Whitespace-only text nodes from the source are dropped and replaced by
/// the indentation; elements whose content is pure text stay on one line.
pub fn to_pretty_xml(doc: &Document) -> String {
    let mut out = String::new();
    write_declaration(doc, &mut out);
    if !out.is_empty() {
        out.push('\n');
    }
    write_node_pretty(doc, doc.root(), 0, &mut out);
    out.push('\n');
    out
}

fn write_node_pretty(doc: &Document, id: NodeId, depth: usize, out: &mut String) {
    let element = match &doc.node(id).kind {
        NodeKind::Element(e) => e,
        NodeKind::Text(t) => {
            out.push_str(&escape_text(t.trim()));
            return;
        }
        NodeKind::CData(t) => {
            out.push_str("<![CDATA[");
            out.push_str(t);
            out.push_str("]]>");
            return;
        }
        NodeKind::Comment(t) => {
            out.push_str("<!--");
            out.push_str(t);
            out.push_str("-->");
            return;
        }
        NodeKind::ProcessingInstruction { target, content } => {
            out.push_str("<?");
            out.push_str(target);
            if !content.is_empty() {
                out.push(' ');
                out.push_str(content);
            }
            out.push_str("?>");
            return;
        }
    };

    out.push('<');
    out.push_str(&element.name.to_string());
    for attr in &element.attributes {
        out.push(' ');
        out.push_str(&attr.name.to_string());
        out.push_str("=\"");
        out.push_str(&escape_attr(&attr.value));
        out.push('"');
    }

    let significant: Vec<NodeId> = element
        .children
        .iter()
        .copied()
        .filter(|&c| match &doc.node(c).kind {
            NodeKind::Text(t) => !t.trim().is_empty(),
            _ => true,
        })
        .collect();

    if significant.is_empty() {
        out.push_str("/>");
        return;
    }

    let text_only = significant
        .iter()
        .all(|&c| matches!(doc.node(c).kind, NodeKind::Text(_) | NodeKind::CData(_)));

    out.push('>');
    if text_only {
        for &child in &significant {
            write_node_pretty(doc, child, depth + 1, out);
        }
    } else {
        for &child in &significant {
            out.push('\n');
            out.push_str(&INDENT.repeat(depth + 1));
            write_node_pretty(doc, child, depth + 1, out);
        }
        out.push('\n');
        out.push_str(&INDENT.repeat(depth));
    }
    out.push_str("</");
    out.push_str(&element.name.to_string());
    out.push('>');
}

// =============================================================================
// Shared helpers
// =============================================================================

fn write_declaration(doc: &Document, out: &mut String) {
    if let Some(decl) = &doc.declaration {
        out.push_str("<?xml version=\"");
        out.push_str(&decl.version);
        out.push('"');
        if let Some(encoding) = &decl.encoding {
            out.push_str(" encoding=\"");
            out.push_str(encoding);
            out.push('"');
        }
        if let Some(standalone) = decl.standalone {
            out.push_str(" standalone=\"");
            out.push_str(if standalone { "yes" } else { "no" });
            out.push('"');
        }
        out.push_str("?>");
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
