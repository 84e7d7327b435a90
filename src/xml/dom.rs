//! In-memory XML document tree.
//!
//! The tree is an arena of nodes addressed by index: children and parents
//! are [`NodeId`]s into a flat `Vec`, so traversal works in both directions
//! without ownership cycles. The tree is mutable and retains parse-time
//! fidelity (attribute order, namespace prefixes, whitespace text nodes) so
//! the raw serialization view can reproduce the document's structure
//! exactly.

use std::fmt;

// =============================================================================
// Names and attributes
// =============================================================================

/// A qualified XML name: optional namespace prefix plus local part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace prefix (`ome` in `ome:Image`), if any
    pub prefix: Option<String>,
    /// Local part of the name
    pub local: String,
}

impl QName {
    /// Split a raw name on the first colon.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((prefix, local)) => QName {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            None => QName {
                prefix: None,
                local: raw.to_string(),
            },
        }
    }

    /// Build an unprefixed name.
    pub fn local(name: &str) -> Self {
        QName {
            prefix: None,
            local: name.to_string(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{}:{}", p, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// One attribute on an element. Order within the element is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

impl Attribute {
    /// Whether this attribute is a namespace declaration (`xmlns` or `xmlns:p`).
    pub fn is_namespace_decl(&self) -> bool {
        self.name.prefix.as_deref() == Some("xmlns")
            || (self.name.prefix.is_none() && self.name.local == "xmlns")
    }
}

/// The `<?xml ...?>` declaration, when the document carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

// =============================================================================
// Nodes
// =============================================================================

/// Index of a node in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// An element: name, ordered attributes, ordered children.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    pub children: Vec<NodeId>,
}

/// Node payload variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction { target: String, content: String },
}

/// One arena slot: payload plus parent back-reference (as an index, so the
/// graph stays acyclic for ownership purposes).
#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

// =============================================================================
// Document
// =============================================================================

/// A parsed XML document tree.
///
/// Produced by [`crate::xml::parse`]; owned exclusively by the report that
/// holds it.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    /// The XML declaration, if the source had one
    pub declaration: Option<XmlDeclaration>,
}

impl Document {
    pub(crate) fn new(nodes: Vec<Node>, root: NodeId, declaration: Option<XmlDeclaration>) -> Self {
        Document {
            nodes,
            root,
            declaration,
        }
    }

    /// The root element's node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Access a node by id.
    ///
    /// # Panics
    /// Panics if the id did not come from this document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Access a node's element payload, if it is an element.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Parent of a node, None for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Child nodes of an element, empty for non-elements.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            NodeKind::Element(e) => &e.children,
            _ => &[],
        }
    }

    /// Child element ids of a node, in document order.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| matches!(self.nodes[c.0].kind, NodeKind::Element(_)))
    }

    /// Look up an attribute value on an element by its full (prefixed) name.
    pub fn attribute<'a>(&'a self, id: NodeId, name: &str) -> Option<&'a str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|a| a.name.to_string() == name)
            .map(|a| a.value.as_str())
    }

    /// Concatenated character content of an element's direct text and
    /// CDATA children.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            match &self.nodes[child.0].kind {
                NodeKind::Text(t) | NodeKind::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    /// Resolve the namespace URI an element's name lives in.
    ///
    /// Walks `xmlns`/`xmlns:prefix` declarations from the element up to the
    /// root, nearest declaration wins.
    pub fn namespace_of(&self, id: NodeId) -> Option<&str> {
        let prefix = self.element(id)?.name.prefix.clone();
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(element) = self.element(node) {
                for attr in &element.attributes {
                    let matches = match &prefix {
                        Some(p) => {
                            attr.name.prefix.as_deref() == Some("xmlns") && attr.name.local == *p
                        }
                        None => attr.name.prefix.is_none() && attr.name.local == "xmlns",
                    };
                    if matches {
                        if attr.value.is_empty() {
                            return None; // un-declaration of the default namespace
                        }
                        return Some(&attr.value);
                    }
                }
            }
            current = self.parent(node);
        }
        None
    }

    /// Number of nodes in the arena (all kinds).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Set (or add) an attribute on an element. Existing attribute order is
    /// kept; a new attribute goes last.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element(e) = &mut self.nodes[id.0].kind {
            let qname = QName::parse(name);
            if let Some(attr) = e.attributes.iter_mut().find(|a| a.name == qname) {
                attr.value = value.to_string();
            } else {
                e.attributes.push(Attribute {
                    name: qname,
                    value: value.to_string(),
                });
            }
        }
    }

    /// Append a new child element and return its id.
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            kind: NodeKind::Element(Element {
                name: QName::parse(name),
                attributes: Vec::new(),
                children: Vec::new(),
            }),
        });
        if let NodeKind::Element(e) = &mut self.nodes[parent.0].kind {
            e.children.push(id);
        }
        id
    }

    /// Append a text node under an element and return its id.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            kind: NodeKind::Text(text.to_string()),
        });
        if let NodeKind::Element(e) = &mut self.nodes[parent.0].kind {
            e.children.push(id);
        }
        id
    }

    // -------------------------------------------------------------------------
    // Structural equality
    // -------------------------------------------------------------------------

    /// Compare two documents structurally: same elements, attributes and
    /// character content. Comments, processing instructions and
    /// whitespace-only text nodes are ignored, so a document and its
    /// re-parsed raw serialization compare equal.
    pub fn structurally_equal(&self, other: &Document) -> bool {
        self.nodes_equal(self.root, other, other.root)
    }

    fn nodes_equal(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        let (ea, eb) = match (self.element(a), other.element(b)) {
            (Some(ea), Some(eb)) => (ea, eb),
            _ => return false,
        };

        if ea.name != eb.name || ea.attributes != eb.attributes {
            return false;
        }

        let ka = self.significant_children(a);
        let kb = other.significant_children(b);
        if ka.len() != kb.len() {
            return false;
        }

        for (&ca, &cb) in ka.iter().zip(kb.iter()) {
            let matches = match (&self.nodes[ca.0].kind, &other.nodes[cb.0].kind) {
                (NodeKind::Element(_), NodeKind::Element(_)) => {
                    self.nodes_equal(ca, other, cb)
                }
                (NodeKind::Text(ta), NodeKind::Text(tb))
                | (NodeKind::CData(ta), NodeKind::CData(tb))
                | (NodeKind::Text(ta), NodeKind::CData(tb))
                | (NodeKind::CData(ta), NodeKind::Text(tb)) => ta == tb,
                _ => false,
            };
            if !matches {
                return false;
            }
        }
        true
    }

    fn significant_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| match &self.nodes[c.0].kind {
                NodeKind::Element(_) => true,
                NodeKind::Text(t) | NodeKind::CData(t) => !t.trim().is_empty(),
                NodeKind::Comment(_) | NodeKind::ProcessingInstruction { .. } => false,
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
