//! Well-formedness XML parsing.
//!
//! Drives quick-xml's event stream into the arena document tree. This stage
//! has no schema awareness: it only cares that tags match, entities resolve
//! and the text decodes. Namespace prefixes and attribute order are kept
//! verbatim so the raw serialization view stays faithful to the source.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::trace;

use crate::error::XmlError;

use super::dom::{
    Attribute, Document, Element, Node, NodeId, NodeKind, QName, XmlDeclaration,
};

/// Parse XML text into a [`Document`].
///
/// Fails with [`XmlError::MalformedXml`] carrying the byte position and a
/// reason for any well-formedness problem: mismatched tags, bad entities,
/// text outside the root, multiple roots, or a truncated document.
pub fn parse(text: &str) -> Result<Document, XmlError> {
    // A BOM may survive as a char if the caller decoded the bytes itself.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = Reader::from_str(text);

    let mut nodes: Vec<Node> = Vec::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut root: Option<NodeId> = None;
    let mut declaration: Option<XmlDeclaration> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(&reader, e.to_string()))?;

        match event {
            Event::Decl(decl) => {
                let version = decl
                    .version()
                    .map_err(|e| malformed(&reader, e.to_string()))?;
                let encoding = match decl.encoding() {
                    Some(enc) => Some(
                        String::from_utf8_lossy(
                            &enc.map_err(|e| malformed(&reader, e.to_string()))?,
                        )
                        .into_owned(),
                    ),
                    None => None,
                };
                let standalone = match decl.standalone() {
                    Some(sa) => {
                        let sa = sa.map_err(|e| malformed(&reader, e.to_string()))?;
                        Some(sa.as_ref() == b"yes")
                    }
                    None => None,
                };
                declaration = Some(XmlDeclaration {
                    version: String::from_utf8_lossy(&version).into_owned(),
                    encoding,
                    standalone,
                });
            }

            Event::Start(start) => {
                let element = element_from_start(&reader, start.name().as_ref(), &start)?;
                let id = push_node(
                    &mut nodes,
                    &mut stack,
                    &mut root,
                    &reader,
                    NodeKind::Element(element),
                )?;
                stack.push(id);
            }

            Event::Empty(start) => {
                let element = element_from_start(&reader, start.name().as_ref(), &start)?;
                push_node(
                    &mut nodes,
                    &mut stack,
                    &mut root,
                    &reader,
                    NodeKind::Element(element),
                )?;
            }

            Event::End(_) => {
                // Tag-name agreement is checked by quick-xml itself.
                stack.pop();
            }

            Event::Text(text) => {
                let raw = std::str::from_utf8(text.as_ref())
                    .map_err(|_| malformed(&reader, "text is not valid UTF-8".to_string()))?;
                let decoded = decode_entities(raw).map_err(|e| malformed(&reader, e))?;
                if stack.is_empty() {
                    if !decoded.trim().is_empty() {
                        return Err(malformed(
                            &reader,
                            "character content outside the root element".to_string(),
                        ));
                    }
                } else if !merge_into_last_text(&mut nodes, &stack, &decoded) {
                    push_node(
                        &mut nodes,
                        &mut stack,
                        &mut root,
                        &reader,
                        NodeKind::Text(decoded),
                    )?;
                }
            }

            Event::GeneralRef(reference) => {
                // Entity references arrive as their own events, splitting the
                // surrounding text; the resolved character is merged back so
                // one run of character data stays one text node.
                let name = String::from_utf8_lossy(reference.as_ref()).into_owned();
                let resolved =
                    resolve_entity(&name).map_err(|e| malformed(&reader, e))?;
                if !stack.is_empty()
                    && !merge_into_last_text(&mut nodes, &stack, &resolved.to_string())
                {
                    push_node(
                        &mut nodes,
                        &mut stack,
                        &mut root,
                        &reader,
                        NodeKind::Text(resolved.to_string()),
                    )?;
                }
            }

            Event::CData(cdata) => {
                let content = String::from_utf8_lossy(cdata.as_ref()).into_owned();
                if !stack.is_empty() {
                    push_node(
                        &mut nodes,
                        &mut stack,
                        &mut root,
                        &reader,
                        NodeKind::CData(content),
                    )?;
                }
            }

            Event::Comment(comment) => {
                if !stack.is_empty() {
                    let content = String::from_utf8_lossy(comment.as_ref()).into_owned();
                    push_node(
                        &mut nodes,
                        &mut stack,
                        &mut root,
                        &reader,
                        NodeKind::Comment(content),
                    )?;
                }
            }

            Event::PI(pi) => {
                if !stack.is_empty() {
                    let target = String::from_utf8_lossy(pi.target()).into_owned();
                    let content = String::from_utf8_lossy(pi.content()).into_owned();
                    push_node(
                        &mut nodes,
                        &mut stack,
                        &mut root,
                        &reader,
                        NodeKind::ProcessingInstruction { target, content },
                    )?;
                }
            }

            Event::DocType(_) => {
                // DTDs are tolerated in the prolog but not interpreted.
            }

            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(malformed(&reader, "unexpected end of document".to_string()));
    }

    let root = root.ok_or_else(|| XmlError::MalformedXml {
        position: text.len() as u64,
        reason: "document has no root element".to_string(),
    })?;

    trace!(nodes = nodes.len(), "parsed XML document");
    Ok(Document::new(nodes, root, declaration))
}

/// Decode raw bytes (file content or an embedded blob) and parse them.
///
/// Handles a UTF-8 byte-order mark and UTF-16 LE/BE inputs identified by
/// their BOM; everything else must be valid UTF-8.
pub fn parse_bytes(bytes: &[u8]) -> Result<Document, XmlError> {
    let text = decode_text(bytes)?;
    parse(&text)
}

/// Decode input bytes to a string, honoring a leading BOM.
pub fn decode_text(bytes: &[u8]) -> Result<String, XmlError> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return std::str::from_utf8(rest).map(str::to_owned).map_err(|e| {
            XmlError::MalformedXml {
                position: e.valid_up_to() as u64 + 3,
                reason: "input is not valid UTF-8".to_string(),
            }
        });
    }

    if bytes.starts_with(&[0xFF, 0xFE]) {
        return decode_utf16(&bytes[2..], false);
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return decode_utf16(&bytes[2..], true);
    }

    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| XmlError::MalformedXml {
            position: e.valid_up_to() as u64,
            reason: "input is not valid UTF-8".to_string(),
        })
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> Result<String, XmlError> {
    if bytes.len() % 2 != 0 {
        return Err(XmlError::MalformedXml {
            position: bytes.len() as u64,
            reason: "UTF-16 input has an odd byte length".to_string(),
        });
    }

    let units = bytes.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });

    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|_| XmlError::MalformedXml {
            position: 0,
            reason: "invalid UTF-16 surrogate sequence".to_string(),
        })
}

// =============================================================================
// Helpers
// =============================================================================

fn malformed(reader: &Reader<&[u8]>, reason: String) -> XmlError {
    XmlError::MalformedXml {
        position: reader.buffer_position() as u64,
        reason,
    }
}

fn element_from_start(
    reader: &Reader<&[u8]>,
    name: &[u8],
    start: &quick_xml::events::BytesStart<'_>,
) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(name)
        .map_err(|_| malformed(reader, "element name is not valid UTF-8".to_string()))?;

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(reader, e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|_| malformed(reader, "attribute name is not valid UTF-8".to_string()))?;
        let raw_value = std::str::from_utf8(&attr.value)
            .map_err(|_| malformed(reader, "attribute value is not valid UTF-8".to_string()))?;
        let value = decode_entities(raw_value).map_err(|e| malformed(reader, e))?;

        attributes.push(Attribute {
            name: QName::parse(key),
            value,
        });
    }

    Ok(Element {
        name: QName::parse(name),
        attributes,
        children: Vec::new(),
    })
}

/// Extend the parent's trailing text node if it has one, so adjacent
/// character data (split by entity-reference events) stays a single node.
fn merge_into_last_text(nodes: &mut [Node], stack: &[NodeId], text: &str) -> bool {
    let Some(&parent) = stack.last() else {
        return false;
    };
    let last = match &nodes[parent.0].kind {
        NodeKind::Element(e) => e.children.last().copied(),
        _ => None,
    };
    if let Some(last) = last {
        if let NodeKind::Text(t) = &mut nodes[last.0].kind {
            t.push_str(text);
            return true;
        }
    }
    false
}

/// Append a node to the arena under the current stack top (or as the root)
/// and wire up both link directions.
fn push_node(
    nodes: &mut Vec<Node>,
    stack: &mut [NodeId],
    root: &mut Option<NodeId>,
    reader: &Reader<&[u8]>,
    kind: NodeKind,
) -> Result<NodeId, XmlError> {
    let parent = stack.last().copied();
    let id = NodeId(nodes.len());

    if parent.is_none() {
        if !matches!(kind, NodeKind::Element(_)) {
            // Comments/PIs outside the root are filtered by the caller;
            // anything else here is a bug.
            return Err(malformed(reader, "content outside the root element".to_string()));
        }
        if root.is_some() {
            return Err(malformed(reader, "multiple root elements".to_string()));
        }
        *root = Some(id);
    }

    nodes.push(Node { parent, kind });

    if let Some(parent) = parent {
        if let NodeKind::Element(e) = &mut nodes[parent.0].kind {
            e.children.push(id);
        }
    }

    Ok(id)
}

/// Resolve the standard XML entities plus numeric character references.
fn decode_entities(raw: &str) -> Result<String, String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| "unterminated entity reference".to_string())?;
        out.push(resolve_entity(&after[..semi])?);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve_entity(name: &str) -> Result<char, String> {
    match name {
        "amp" => Ok('&'),
        "lt" => Ok('<'),
        "gt" => Ok('>'),
        "apos" => Ok('\''),
        "quot" => Ok('"'),
        _ => {
            if let Some(num) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                let code = u32::from_str_radix(num, 16)
                    .map_err(|_| format!("invalid character reference &{};", name))?;
                char::from_u32(code).ok_or_else(|| format!("invalid code point &{};", name))
            } else if let Some(num) = name.strip_prefix('#') {
                let code: u32 = num
                    .parse()
                    .map_err(|_| format!("invalid character reference &{};", name))?;
                char::from_u32(code).ok_or_else(|| format!("invalid code point &{};", name))
            } else {
                Err(format!("unknown entity &{};", name))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
