//! XML parsing, document model and serialization.
//!
//! The pipeline is deliberately split in two stages: well-formedness lives
//! here, schema validity lives in [`crate::schema`]. A document that parses
//! can always be serialized back out, valid or not.

mod dom;
mod parser;
mod serialize;

pub use dom::{Attribute, Document, Element, Node, NodeId, NodeKind, QName, XmlDeclaration};
pub use parser::{decode_text, parse, parse_bytes};
pub use serialize::{to_pretty_xml, to_raw_xml};
