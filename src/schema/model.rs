//! Compiled schema model.
//!
//! The loader flattens the XSD document into these lookup tables once, at
//! construction; validation then runs against plain maps with no XML
//! traversal. The model covers the subset of XSD the OME schema actually
//! uses: global elements, complex types with sequence content, attribute
//! declarations, and simple types restricted by enumeration.

use std::collections::HashMap;

// =============================================================================
// Type references
// =============================================================================

/// Built-in XSD simple types recognized by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltInType {
    String,
    Id,
    Boolean,
    Int,
    NonNegativeInt,
    PositiveInt,
    Float,
    DateTime,
    AnyUri,
}

impl BuiltInType {
    /// Map an `xsd:`-qualified (or bare) type name to a built-in.
    pub fn from_xsd_name(name: &str) -> Option<Self> {
        let local = name.split_once(':').map_or(name, |(_, local)| local);
        match local {
            "string" | "token" | "normalizedString" => Some(BuiltInType::String),
            "ID" => Some(BuiltInType::Id),
            "IDREF" => Some(BuiltInType::String),
            "boolean" => Some(BuiltInType::Boolean),
            "int" | "integer" | "long" => Some(BuiltInType::Int),
            "nonNegativeInteger" | "unsignedInt" | "unsignedLong" => {
                Some(BuiltInType::NonNegativeInt)
            }
            "positiveInteger" => Some(BuiltInType::PositiveInt),
            "float" | "double" | "decimal" => Some(BuiltInType::Float),
            "dateTime" => Some(BuiltInType::DateTime),
            "anyURI" => Some(BuiltInType::AnyUri),
            _ => None,
        }
    }

    /// Human-readable name for violation messages.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltInType::String => "string",
            BuiltInType::Id => "ID",
            BuiltInType::Boolean => "boolean",
            BuiltInType::Int => "integer",
            BuiltInType::NonNegativeInt => "non-negative integer",
            BuiltInType::PositiveInt => "positive integer",
            BuiltInType::Float => "floating-point number",
            BuiltInType::DateTime => "dateTime",
            BuiltInType::AnyUri => "URI",
        }
    }

    /// Check a lexical value against this type.
    pub fn check_value(&self, value: &str) -> bool {
        match self {
            BuiltInType::String | BuiltInType::AnyUri => true,
            BuiltInType::Id => {
                !value.is_empty() && !value.chars().any(|c| c.is_whitespace())
            }
            BuiltInType::Boolean => matches!(value, "true" | "false" | "1" | "0"),
            BuiltInType::Int => value.parse::<i64>().is_ok(),
            BuiltInType::NonNegativeInt => value.parse::<u64>().is_ok(),
            BuiltInType::PositiveInt => value.parse::<u64>().map_or(false, |v| v >= 1),
            BuiltInType::Float => {
                matches!(value, "INF" | "-INF" | "NaN") || value.parse::<f64>().is_ok()
            }
            BuiltInType::DateTime => is_date_time(value),
        }
    }
}

/// Minimal lexical check for `xsd:dateTime`: `YYYY-MM-DDThh:mm:ss` with an
/// optional fractional part and optional timezone suffix.
fn is_date_time(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() < 19 || bytes[4] != b'-' || bytes[7] != b'-' || bytes[10] != b'T' {
        return false;
    }
    if bytes[13] != b':' || bytes[16] != b':' {
        return false;
    }
    let digits = [0, 1, 2, 3, 5, 6, 8, 9, 11, 12, 14, 15, 17, 18];
    if digits.iter().any(|&i| !bytes[i].is_ascii_digit()) {
        return false;
    }

    let mut rest = &value[19..];
    if let Some(after_dot) = rest.strip_prefix('.') {
        let frac_len = after_dot
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if frac_len == 0 {
            return false;
        }
        rest = &after_dot[frac_len..];
    }
    match rest {
        "" | "Z" => true,
        _ => {
            // ±hh:mm offset
            let offset = rest.strip_prefix('+').or_else(|| rest.strip_prefix('-'));
            matches!(offset, Some(o) if o.len() == 5
                && o.as_bytes()[2] == b':'
                && o.bytes().enumerate().all(|(i, b)| i == 2 || b.is_ascii_digit()))
        }
    }
}

/// Reference to a simple type: a built-in or a named restriction defined in
/// the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleTypeRef {
    BuiltIn(BuiltInType),
    Named(String),
}

/// Reference to the type of an element's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Key into [`Schema::complex_types`]
    Complex(String),
    /// Text-only content checked as a simple type
    Simple(SimpleTypeRef),
}

// =============================================================================
// Declarations
// =============================================================================

/// A named simple type: a built-in base narrowed by an optional
/// enumeration facet.
#[derive(Debug, Clone)]
pub struct SimpleType {
    pub base: BuiltInType,
    /// Allowed values; empty means no enumeration facet
    pub enumeration: Vec<String>,
}

impl SimpleType {
    pub fn accepts(&self, value: &str) -> bool {
        if !self.base.check_value(value) {
            return false;
        }
        self.enumeration.is_empty() || self.enumeration.iter().any(|v| v == value)
    }
}

/// An attribute declared on a complex type.
#[derive(Debug, Clone)]
pub struct AttributeDecl {
    pub name: String,
    pub ty: SimpleTypeRef,
    pub required: bool,
}

/// One slot in a sequence content model.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Local name of the expected child element
    pub element: String,
    pub type_ref: TypeRef,
    pub min_occurs: u32,
    /// None = unbounded
    pub max_occurs: Option<u32>,
}

/// A complex type: sequence particles, attributes, and (for simpleContent)
/// the type its character content must satisfy.
#[derive(Debug, Clone, Default)]
pub struct ComplexType {
    pub particles: Vec<Particle>,
    pub attributes: Vec<AttributeDecl>,
    /// Set for simpleContent types; element-only types leave it None
    pub text: Option<SimpleTypeRef>,
}

/// A global element declaration.
#[derive(Debug, Clone)]
pub struct ElementDecl {
    pub name: String,
    pub type_ref: TypeRef,
}

// =============================================================================
// Schema
// =============================================================================

/// A compiled schema: the validation tables for one target namespace.
#[derive(Debug, Clone)]
pub struct Schema {
    pub target_namespace: String,
    pub elements: HashMap<String, ElementDecl>,
    pub complex_types: HashMap<String, ComplexType>,
    pub simple_types: HashMap<String, SimpleType>,
}

impl Schema {
    /// Look up a global (root-eligible) element by local name.
    pub fn global_element(&self, name: &str) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    /// Look up a complex type by key.
    pub fn complex_type(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types.get(name)
    }

    /// Check a value against a simple type reference. Unresolvable named
    /// references are treated as accepting; the loader rejects them at
    /// construction, so this is unreachable in practice.
    pub fn accepts_simple(&self, ty: &SimpleTypeRef, value: &str) -> bool {
        match ty {
            SimpleTypeRef::BuiltIn(b) => b.check_value(value),
            SimpleTypeRef::Named(name) => self
                .simple_types
                .get(name)
                .map_or(true, |st| st.accepts(value)),
        }
    }

    /// Describe what a simple type reference expects, for violation messages.
    pub fn describe_simple(&self, ty: &SimpleTypeRef) -> String {
        match ty {
            SimpleTypeRef::BuiltIn(b) => b.name().to_string(),
            SimpleTypeRef::Named(name) => match self.simple_types.get(name) {
                Some(st) if !st.enumeration.is_empty() => {
                    format!("one of [{}]", st.enumeration.join(", "))
                }
                Some(st) => st.base.name().to_string(),
                None => name.clone(),
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
