//! Violation records.
//!
//! A violation is data, not an error: a structurally readable input that
//! breaks a schema rule produces a report carrying violations, while the
//! process itself succeeds. Only I/O failures surface as errors.

use std::fmt;

use serde::Serialize;

/// The rule a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationRule {
    /// A required child element is absent
    MissingElement,
    /// An element appears where the content model does not allow it
    UnexpectedElement,
    /// An element repeats beyond its maxOccurs bound
    TooManyOccurrences,
    /// A required attribute is absent
    MissingAttribute,
    /// An attribute not declared on the element's type
    UnexpectedAttribute,
    /// An attribute or text value fails its simple type
    InvalidValue,
    /// An ID value is used more than once in the document
    DuplicateId,
    /// The root element is not in the schema's target namespace
    WrongNamespace,
    /// The input is not well-formed XML
    MalformedDocument,
    /// A TIFF container carries no embedded XML metadata at all
    NoEmbeddedMetadata,
    /// The TIFF container itself is structurally broken
    MalformedContainer,
}

impl fmt::Display for ViolationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationRule::MissingElement => "missing element",
            ViolationRule::UnexpectedElement => "unexpected element",
            ViolationRule::TooManyOccurrences => "too many occurrences",
            ViolationRule::MissingAttribute => "missing attribute",
            ViolationRule::UnexpectedAttribute => "unexpected attribute",
            ViolationRule::InvalidValue => "invalid value",
            ViolationRule::DuplicateId => "duplicate ID",
            ViolationRule::WrongNamespace => "wrong namespace",
            ViolationRule::MalformedDocument => "malformed document",
            ViolationRule::NoEmbeddedMetadata => "no embedded metadata",
            ViolationRule::MalformedContainer => "malformed container",
        };
        f.write_str(name)
    }
}

/// One schema violation, located by a path into the document
/// (`/OME/Image[2]/@ID` style).
#[derive(Debug, Clone, Serialize)]
pub struct SchemaViolation {
    pub rule: ViolationRule,
    /// Path to the offending node; repeated siblings carry 1-based indices
    pub location: String,
    /// What the schema expects there, when that is expressible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// What the document actually contains
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<String>,
    /// Human-readable description
    pub message: String,
}

impl SchemaViolation {
    pub fn new(rule: ViolationRule, location: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaViolation {
            rule,
            location: location.into(),
            expected: None,
            found: None,
            message: message.into(),
        }
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.rule, self.location, self.message)
    }
}
