//! Schema validation of parsed documents.
//!
//! Validation is total: it walks the whole tree and collects every
//! violation in document order instead of stopping at the first one. The
//! sequence content model is checked with a particle cursor, so a missing
//! required child is reported exactly once, at the point the model expected
//! it.

use std::collections::HashMap;

use tracing::debug;

use crate::report::{SchemaViolation, ViolationRule};
use crate::xml::{Document, NodeId};

use super::model::{BuiltInType, ComplexType, Schema, SimpleTypeRef, TypeRef};

/// Result of validating one document against a schema.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Every violation found, in document order
    pub violations: Vec<SchemaViolation>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Validate a document against a compiled schema.
pub fn validate_document(doc: &Document, schema: &Schema) -> ValidationOutcome {
    let mut walker = Walker {
        doc,
        schema,
        violations: Vec::new(),
        seen_ids: HashMap::new(),
    };
    walker.validate_root();
    debug!(violations = walker.violations.len(), "validated document");
    ValidationOutcome {
        violations: walker.violations,
    }
}

// =============================================================================
// Walker
// =============================================================================

struct Walker<'a> {
    doc: &'a Document,
    schema: &'a Schema,
    violations: Vec<SchemaViolation>,
    /// ID value -> location of its first occurrence
    seen_ids: HashMap<String, String>,
}

impl<'a> Walker<'a> {
    fn validate_root(&mut self) {
        let root = self.doc.root();
        let name = match self.doc.element(root) {
            Some(e) => e.name.local.clone(),
            None => return,
        };
        let path = format!("/{}", name);

        let decl = match self.schema.global_element(&name) {
            Some(decl) => decl,
            None => {
                self.violations.push(
                    SchemaViolation::new(
                        ViolationRule::UnexpectedElement,
                        path,
                        format!("<{}> is not a declared root element", name),
                    )
                    .found(name),
                );
                return;
            }
        };

        match self.doc.namespace_of(root) {
            Some(ns) if ns == self.schema.target_namespace => {}
            other => {
                self.violations.push(
                    SchemaViolation::new(
                        ViolationRule::WrongNamespace,
                        path.clone(),
                        format!(
                            "root element is not in namespace {}",
                            self.schema.target_namespace
                        ),
                    )
                    .expected(self.schema.target_namespace.clone())
                    .found(other.unwrap_or("(no namespace)").to_string()),
                );
                // Structure is still worth checking.
            }
        }

        let type_ref = decl.type_ref.clone();
        self.validate_element(root, &path, &type_ref);
    }

    fn validate_element(&mut self, id: NodeId, path: &str, type_ref: &TypeRef) {
        match type_ref {
            TypeRef::Simple(ty) => self.validate_simple_element(id, path, ty),
            TypeRef::Complex(name) => {
                let Some(ty) = self.schema.complex_type(name).cloned() else {
                    // Dangling references are rejected at compile time.
                    return;
                };
                self.validate_attributes(id, path, &ty);
                self.validate_text(id, path, &ty);
                self.validate_children(id, path, &ty);
            }
        }
    }

    /// A text-only element: no attributes, no child elements, content
    /// matching the simple type.
    fn validate_simple_element(&mut self, id: NodeId, path: &str, ty: &SimpleTypeRef) {
        if let Some(element) = self.doc.element(id) {
            for attr in &element.attributes {
                if attr.is_namespace_decl() || attr.name.prefix.as_deref() == Some("xsi") {
                    continue;
                }
                self.violations.push(
                    SchemaViolation::new(
                        ViolationRule::UnexpectedAttribute,
                        format!("{}/@{}", path, attr.name),
                        format!("attribute {} is not declared here", attr.name),
                    )
                    .found(attr.value.clone()),
                );
            }
        }

        for child in self.doc.child_elements(id).collect::<Vec<_>>() {
            if let Some(element) = self.doc.element(child) {
                self.violations.push(
                    SchemaViolation::new(
                        ViolationRule::UnexpectedElement,
                        format!("{}/{}", path, element.name.local),
                        format!("<{}> is not allowed in text-only content", element.name.local),
                    )
                    .found(element.name.local.clone()),
                );
            }
        }

        let text = self.doc.text_content(id);
        let value = text.trim();
        if !self.schema.accepts_simple(ty, value) {
            self.violations.push(
                SchemaViolation::new(
                    ViolationRule::InvalidValue,
                    path.to_string(),
                    "character content does not match its type".to_string(),
                )
                .expected(self.schema.describe_simple(ty))
                .found(value.to_string()),
            );
        } else {
            self.track_id(ty, value, path);
        }
    }

    fn validate_attributes(&mut self, id: NodeId, path: &str, ty: &ComplexType) {
        let Some(element) = self.doc.element(id) else {
            return;
        };

        // Present attributes first, in document order.
        for attr in element.attributes.clone() {
            if attr.is_namespace_decl() || attr.name.prefix.as_deref() == Some("xsi") {
                continue;
            }
            let attr_path = format!("{}/@{}", path, attr.name);
            match ty.attributes.iter().find(|d| d.name == attr.name.local) {
                Some(decl) => {
                    if !self.schema.accepts_simple(&decl.ty, &attr.value) {
                        self.violations.push(
                            SchemaViolation::new(
                                ViolationRule::InvalidValue,
                                attr_path,
                                format!("value of {} does not match its type", attr.name),
                            )
                            .expected(self.schema.describe_simple(&decl.ty))
                            .found(attr.value.clone()),
                        );
                    } else {
                        self.track_id(&decl.ty, &attr.value, &attr_path);
                    }
                }
                None => {
                    self.violations.push(
                        SchemaViolation::new(
                            ViolationRule::UnexpectedAttribute,
                            attr_path,
                            format!("attribute {} is not declared here", attr.name),
                        )
                        .found(attr.value),
                    );
                }
            }
        }

        // Then required-but-absent, in declaration order.
        for decl in &ty.attributes {
            if decl.required && self.doc.attribute(id, &decl.name).is_none() {
                self.violations.push(
                    SchemaViolation::new(
                        ViolationRule::MissingAttribute,
                        format!("{}/@{}", path, decl.name),
                        format!("required attribute {} is missing", decl.name),
                    )
                    .expected(self.schema.describe_simple(&decl.ty)),
                );
            }
        }
    }

    fn validate_text(&mut self, id: NodeId, path: &str, ty: &ComplexType) {
        let text = self.doc.text_content(id);
        let value = text.trim();

        match &ty.text {
            Some(simple) => {
                if !self.schema.accepts_simple(simple, value) {
                    self.violations.push(
                        SchemaViolation::new(
                            ViolationRule::InvalidValue,
                            path.to_string(),
                            "character content does not match its type".to_string(),
                        )
                        .expected(self.schema.describe_simple(simple))
                        .found(value.to_string()),
                    );
                }
            }
            None => {
                if !value.is_empty() {
                    self.violations.push(
                        SchemaViolation::new(
                            ViolationRule::InvalidValue,
                            path.to_string(),
                            "character content is not allowed in element-only content"
                                .to_string(),
                        )
                        .found(value.to_string()),
                    );
                }
            }
        }
    }

    /// Check child elements against the sequence content model with a
    /// particle cursor, recursing into each matched child.
    fn validate_children(&mut self, id: NodeId, path: &str, ty: &ComplexType) {
        let children: Vec<NodeId> = self.doc.child_elements(id).collect();

        let mut cursor = 0usize;
        let mut count = 0u32;
        let mut sibling_index: HashMap<String, u32> = HashMap::new();

        for child in children {
            let Some(name) = self.doc.element(child).map(|e| e.name.local.clone()) else {
                continue;
            };
            let index = sibling_index.entry(name.clone()).or_insert(0);
            *index += 1;
            let child_path = format!("{}/{}[{}]", path, name, index);

            loop {
                let Some(particle) = ty.particles.get(cursor) else {
                    self.violations.push(
                        SchemaViolation::new(
                            ViolationRule::UnexpectedElement,
                            child_path.clone(),
                            format!("<{}> is not allowed here", name),
                        )
                        .found(name.clone()),
                    );
                    break;
                };

                if particle.element == name {
                    count += 1;
                    if let Some(max) = particle.max_occurs {
                        if count == max + 1 {
                            // Report the bound once, at the first excess occurrence.
                            self.violations.push(
                                SchemaViolation::new(
                                    ViolationRule::TooManyOccurrences,
                                    child_path.clone(),
                                    format!("<{}> may appear at most {} time(s)", name, max),
                                )
                                .expected(format!("at most {}", max))
                                .found(format!("{} or more", count)),
                            );
                        }
                    }
                    let type_ref = particle.type_ref.clone();
                    self.validate_element(child, &child_path, &type_ref);
                    break;
                }

                if count < particle.min_occurs {
                    self.violations.push(
                        SchemaViolation::new(
                            ViolationRule::MissingElement,
                            format!("{}/{}", path, particle.element),
                            format!("required element <{}> is missing", particle.element),
                        )
                        .expected(particle.element.clone()),
                    );
                }
                cursor += 1;
                count = 0;
            }
        }

        // Particles the document never reached.
        while let Some(particle) = ty.particles.get(cursor) {
            if count < particle.min_occurs {
                self.violations.push(
                    SchemaViolation::new(
                        ViolationRule::MissingElement,
                        format!("{}/{}", path, particle.element),
                        format!("required element <{}> is missing", particle.element),
                    )
                    .expected(particle.element.clone()),
                );
            }
            cursor += 1;
            count = 0;
        }
    }

    /// Record ID-typed values and flag reuse.
    fn track_id(&mut self, ty: &SimpleTypeRef, value: &str, path: &str) {
        let is_id = match ty {
            SimpleTypeRef::BuiltIn(b) => *b == BuiltInType::Id,
            SimpleTypeRef::Named(name) => self
                .schema
                .simple_types
                .get(name)
                .map_or(false, |st| st.base == BuiltInType::Id),
        };
        if !is_id || value.is_empty() {
            return;
        }

        if let Some(first) = self.seen_ids.get(value) {
            self.violations.push(
                SchemaViolation::new(
                    ViolationRule::DuplicateId,
                    path.to_string(),
                    format!("ID \"{}\" is already used at {}", value, first),
                )
                .found(value.to_string()),
            );
        } else {
            self.seen_ids
                .insert(value.to_string(), path.to_string());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::loader;
    use crate::xml::parse;

    fn test_schema() -> Schema {
        loader::from_str(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                           targetNamespace="urn:test">
                 <xsd:element name="OME" type="OMEType"/>
                 <xsd:complexType name="OMEType">
                   <xsd:sequence>
                     <xsd:element name="Image" type="ImageType" minOccurs="0" maxOccurs="unbounded"/>
                   </xsd:sequence>
                 </xsd:complexType>
                 <xsd:complexType name="ImageType">
                   <xsd:sequence>
                     <xsd:element name="AcquisitionDate" type="xsd:dateTime" minOccurs="0"/>
                     <xsd:element name="Pixels" type="PixelsType"/>
                   </xsd:sequence>
                   <xsd:attribute name="ID" type="xsd:ID" use="required"/>
                   <xsd:attribute name="Name" type="xsd:string"/>
                 </xsd:complexType>
                 <xsd:complexType name="PixelsType">
                   <xsd:attribute name="ID" type="xsd:ID" use="required"/>
                   <xsd:attribute name="SizeX" type="xsd:positiveInteger" use="required"/>
                   <xsd:attribute name="DimensionOrder" type="DimensionOrderType"/>
                 </xsd:complexType>
                 <xsd:simpleType name="DimensionOrderType">
                   <xsd:restriction base="xsd:string">
                     <xsd:enumeration value="XYZCT"/>
                     <xsd:enumeration value="XYZTC"/>
                   </xsd:restriction>
                 </xsd:simpleType>
               </xsd:schema>"#,
        )
        .unwrap()
    }

    fn check(xml: &str) -> ValidationOutcome {
        let doc = parse(xml).unwrap();
        validate_document(&doc, &test_schema())
    }

    #[test]
    fn test_valid_document() {
        let outcome = check(
            r#"<OME xmlns="urn:test">
                 <Image ID="Image:0" Name="sample">
                   <AcquisitionDate>2024-01-15T10:30:00</AcquisitionDate>
                   <Pixels ID="Pixels:0" SizeX="512" DimensionOrder="XYZCT"/>
                 </Image>
               </OME>"#,
        );
        assert!(outcome.is_valid(), "{:?}", outcome.violations);
    }

    #[test]
    fn test_empty_root_is_valid() {
        let outcome = check(r#"<OME xmlns="urn:test"/>"#);
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_missing_required_attribute() {
        let outcome = check(
            r#"<OME xmlns="urn:test">
                 <Image><Pixels ID="P:0" SizeX="1"/></Image>
               </OME>"#,
        );
        assert!(!outcome.is_valid());
        let v = &outcome.violations[0];
        assert_eq!(v.rule, ViolationRule::MissingAttribute);
        assert_eq!(v.location, "/OME/Image[1]/@ID");
    }

    #[test]
    fn test_missing_required_element() {
        let outcome = check(r#"<OME xmlns="urn:test"><Image ID="I:0"/></OME>"#);
        assert_eq!(outcome.violations.len(), 1);
        let v = &outcome.violations[0];
        assert_eq!(v.rule, ViolationRule::MissingElement);
        assert_eq!(v.location, "/OME/Image[1]/Pixels");
    }

    #[test]
    fn test_unexpected_element() {
        let outcome = check(
            r#"<OME xmlns="urn:test">
                 <Image ID="I:0"><Pixels ID="P:0" SizeX="1"/><Bogus/></Image>
               </OME>"#,
        );
        assert!(outcome
            .violations
            .iter()
            .any(|v| v.rule == ViolationRule::UnexpectedElement
                && v.location == "/OME/Image[1]/Bogus[1]"));
    }

    #[test]
    fn test_invalid_attribute_value() {
        let outcome = check(
            r#"<OME xmlns="urn:test">
                 <Image ID="I:0"><Pixels ID="P:0" SizeX="0"/></Image>
               </OME>"#,
        );
        let v = &outcome.violations[0];
        assert_eq!(v.rule, ViolationRule::InvalidValue);
        assert_eq!(v.location, "/OME/Image[1]/Pixels[1]/@SizeX");
        assert_eq!(v.expected.as_deref(), Some("positive integer"));
        assert_eq!(v.found.as_deref(), Some("0"));
    }

    #[test]
    fn test_enumeration_violation() {
        let outcome = check(
            r#"<OME xmlns="urn:test">
                 <Image ID="I:0"><Pixels ID="P:0" SizeX="1" DimensionOrder="XYCZT"/></Image>
               </OME>"#,
        );
        let v = &outcome.violations[0];
        assert_eq!(v.rule, ViolationRule::InvalidValue);
        assert!(v.expected.as_deref().unwrap().contains("XYZCT"));
    }

    #[test]
    fn test_unexpected_attribute() {
        let outcome = check(
            r#"<OME xmlns="urn:test">
                 <Image ID="I:0" Color="red"><Pixels ID="P:0" SizeX="1"/></Image>
               </OME>"#,
        );
        let v = &outcome.violations[0];
        assert_eq!(v.rule, ViolationRule::UnexpectedAttribute);
        assert_eq!(v.location, "/OME/Image[1]/@Color");
    }

    #[test]
    fn test_wrong_namespace() {
        let outcome = check(r#"<OME xmlns="urn:other"/>"#);
        assert_eq!(outcome.violations[0].rule, ViolationRule::WrongNamespace);
        assert_eq!(
            outcome.violations[0].found.as_deref(),
            Some("urn:other")
        );
    }

    #[test]
    fn test_missing_namespace() {
        let outcome = check("<OME/>");
        assert_eq!(outcome.violations[0].rule, ViolationRule::WrongNamespace);
    }

    #[test]
    fn test_undeclared_root() {
        let outcome = check(r#"<Other xmlns="urn:test"/>"#);
        assert_eq!(
            outcome.violations[0].rule,
            ViolationRule::UnexpectedElement
        );
        assert_eq!(outcome.violations[0].location, "/Other");
    }

    #[test]
    fn test_duplicate_ids() {
        let outcome = check(
            r#"<OME xmlns="urn:test">
                 <Image ID="same"><Pixels ID="P:0" SizeX="1"/></Image>
                 <Image ID="same"><Pixels ID="P:1" SizeX="1"/></Image>
               </OME>"#,
        );
        let v = outcome
            .violations
            .iter()
            .find(|v| v.rule == ViolationRule::DuplicateId)
            .unwrap();
        assert_eq!(v.location, "/OME/Image[2]/@ID");
    }

    #[test]
    fn test_total_validation_collects_everything() {
        let outcome = check(
            r#"<OME xmlns="urn:test">
                 <Image>
                   <Pixels SizeX="zero"/>
                 </Image>
               </OME>"#,
        );
        // Missing Image ID, missing Pixels ID, bad SizeX: all reported.
        assert!(outcome.violations.len() >= 3);
        assert!(outcome
            .violations
            .iter()
            .any(|v| v.location == "/OME/Image[1]/@ID"));
        assert!(outcome
            .violations
            .iter()
            .any(|v| v.location == "/OME/Image[1]/Pixels[1]/@SizeX"));
    }

    #[test]
    fn test_sibling_indices_are_per_name() {
        let outcome = check(
            r#"<OME xmlns="urn:test">
                 <Image ID="a"><Pixels ID="p0" SizeX="1"/></Image>
                 <Image ID="b"><Pixels ID="p1" SizeX="bad"/></Image>
               </OME>"#,
        );
        assert_eq!(
            outcome.violations[0].location,
            "/OME/Image[2]/Pixels[1]/@SizeX"
        );
    }

    #[test]
    fn test_text_in_element_only_content() {
        let outcome = check(
            r#"<OME xmlns="urn:test">stray text<Image ID="I:0"><Pixels ID="P:0" SizeX="1"/></Image></OME>"#,
        );
        assert!(outcome
            .violations
            .iter()
            .any(|v| v.rule == ViolationRule::InvalidValue && v.location == "/OME"));
    }

    #[test]
    fn test_simple_typed_element_content() {
        let outcome = check(
            r#"<OME xmlns="urn:test">
                 <Image ID="I:0">
                   <AcquisitionDate>not a date</AcquisitionDate>
                   <Pixels ID="P:0" SizeX="1"/>
                 </Image>
               </OME>"#,
        );
        let v = &outcome.violations[0];
        assert_eq!(v.rule, ViolationRule::InvalidValue);
        assert_eq!(v.location, "/OME/Image[1]/AcquisitionDate[1]");
        assert_eq!(v.expected.as_deref(), Some("dateTime"));
    }
}
