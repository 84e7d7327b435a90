//! Schema loading and custom-schema validation through the public API.

use std::path::Path;

use ome_validator::error::SchemaError;
use ome_validator::report::{OmeValidator, ViolationRule};
use ome_validator::schema;

use super::test_utils::{temp_file_with, VALID_OME};

const CUSTOM_SCHEMA: &str = r#"<?xml version="1.0"?>
<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
            targetNamespace="urn:custom">
  <xsd:element name="Plate" type="PlateType"/>
  <xsd:complexType name="PlateType">
    <xsd:sequence>
      <xsd:element name="Well" type="WellType" minOccurs="1" maxOccurs="unbounded"/>
    </xsd:sequence>
    <xsd:attribute name="ID" type="xsd:ID" use="required"/>
  </xsd:complexType>
  <xsd:complexType name="WellType">
    <xsd:attribute name="Row" type="xsd:nonNegativeInteger" use="required"/>
    <xsd:attribute name="Column" type="xsd:nonNegativeInteger" use="required"/>
  </xsd:complexType>
</xsd:schema>"#;

#[test]
fn test_load_custom_schema_from_file() {
    let file = temp_file_with(".xsd", CUSTOM_SCHEMA.as_bytes());
    let validator = OmeValidator::from_schema_file(file.path()).unwrap();
    assert_eq!(validator.schema().target_namespace, "urn:custom");

    let report = validator.validate_text(
        Path::new("plate.xml"),
        r#"<Plate xmlns="urn:custom" ID="Plate:1"><Well Row="0" Column="0"/></Plate>"#,
    );
    assert!(report.is_xsd_valid, "{:?}", report.violations);
}

#[test]
fn test_custom_schema_rejects_bad_document() {
    let file = temp_file_with(".xsd", CUSTOM_SCHEMA.as_bytes());
    let validator = OmeValidator::from_schema_file(file.path()).unwrap();

    let report = validator.validate_text(
        Path::new("plate.xml"),
        r#"<Plate xmlns="urn:custom" ID="Plate:1"/>"#,
    );
    assert!(!report.is_xsd_valid);
    assert!(report
        .violations
        .iter()
        .any(|v| v.rule == ViolationRule::MissingElement && v.location == "/Plate/Well"));
}

#[test]
fn test_custom_schema_does_not_accept_ome() {
    let file = temp_file_with(".xsd", CUSTOM_SCHEMA.as_bytes());
    let validator = OmeValidator::from_schema_file(file.path()).unwrap();

    let report = validator.validate_text(Path::new("ome.xml"), VALID_OME);
    assert!(!report.is_xsd_valid);
    assert_eq!(
        report.violations[0].rule,
        ViolationRule::UnexpectedElement
    );
}

#[test]
fn test_schema_file_missing() {
    let result = OmeValidator::from_schema_file(Path::new("/nonexistent/schema.xsd"));
    assert!(matches!(result, Err(SchemaError::Io(_))));
}

#[test]
fn test_schema_file_not_xml() {
    let file = temp_file_with(".xsd", b"not xml at all");
    let result = OmeValidator::from_schema_file(file.path());
    assert!(matches!(result, Err(SchemaError::Malformed(_))));
}

#[test]
fn test_schema_file_wrong_root() {
    let file = temp_file_with(".xsd", b"<OME/>");
    let result = OmeValidator::from_schema_file(file.path());
    assert!(matches!(result, Err(SchemaError::NotASchema(_))));
}

#[test]
fn test_bundled_schema_is_shared() {
    // Two bundled validators compile the schema once and share it.
    let a = OmeValidator::bundled().unwrap();
    let b = OmeValidator::bundled().unwrap();
    assert!(std::ptr::eq(a.schema(), b.schema()));
}

#[test]
fn test_bundled_schema_shape() {
    let schema = schema::bundled().unwrap();
    assert!(schema.global_element("OME").is_some());
    assert!(schema.complex_types.contains_key("ImageType"));
    assert!(schema.complex_types.contains_key("PixelsType"));
    assert!(schema.simple_types.contains_key("DimensionOrderType"));
}
