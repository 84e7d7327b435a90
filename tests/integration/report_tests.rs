//! End-to-end validation reports: standalone XML files and TIFF containers.

use ome_validator::error::{IoError, XmlError};
use ome_validator::report::{OmeValidator, SourceKind, ViolationRule};
use ome_validator::xml;

use super::test_utils::{
    temp_file_with, Page, TiffBuilder, FREE_TEXT_DESCRIPTION, OME_MISSING_IMAGE_ID, VALID_OME,
};

fn validator() -> OmeValidator {
    OmeValidator::bundled().unwrap()
}

// =============================================================================
// Standalone XML files
// =============================================================================

#[tokio::test]
async fn test_valid_xml_file() {
    let file = temp_file_with(".ome.xml", VALID_OME.as_bytes());
    let report = validator().validate_file(file.path()).await.unwrap();

    assert!(report.is_xsd_valid, "{:?}", report.violations);
    assert!(!report.is_ome_tiff);
    assert_eq!(report.kind, SourceKind::Xml);
    assert!(report.violations.is_empty());
}

#[tokio::test]
async fn test_xml_file_missing_image_id() {
    let file = temp_file_with(".ome.xml", OME_MISSING_IMAGE_ID.as_bytes());
    let report = validator().validate_file(file.path()).await.unwrap();

    assert!(!report.is_xsd_valid);
    let violation = report
        .violations
        .iter()
        .find(|v| v.rule == ViolationRule::MissingAttribute)
        .unwrap();
    assert_eq!(violation.location, "/OME/Image[1]/@ID");
}

#[tokio::test]
async fn test_malformed_xml_file() {
    let file = temp_file_with(".ome.xml", b"<OME><Image></OME>");
    let report = validator().validate_file(file.path()).await.unwrap();

    assert!(!report.is_xsd_valid);
    assert_eq!(report.violations[0].rule, ViolationRule::MalformedDocument);
    assert!(matches!(report.to_raw_xml(), Err(XmlError::NoDocument)));
}

#[tokio::test]
async fn test_missing_file_is_an_error() {
    let result = validator()
        .validate_file(std::path::Path::new("/nonexistent/metadata.ome.xml"))
        .await;
    assert!(matches!(result, Err(IoError::NotFound(_))));
}

// =============================================================================
// TIFF containers
// =============================================================================

#[tokio::test]
async fn test_ome_tiff_with_valid_metadata() {
    let file = TiffBuilder::new()
        .page(Page::with_description(VALID_OME))
        .write_temp();
    let report = validator().validate_tiff(file.path()).await.unwrap();

    assert!(report.is_ome_tiff);
    assert!(report.is_xsd_valid, "{:?}", report.violations);
    assert_eq!(report.kind, SourceKind::Tiff);
}

#[tokio::test]
async fn test_ome_tiff_with_invalid_metadata() {
    let file = TiffBuilder::new()
        .page(Page::with_description(OME_MISSING_IMAGE_ID))
        .write_temp();
    let report = validator().validate_tiff(file.path()).await.unwrap();

    // Still an OME-TIFF: the metadata parsed, it just fails the schema.
    assert!(report.is_ome_tiff);
    assert!(!report.is_xsd_valid);
    assert!(report
        .violations
        .iter()
        .any(|v| v.location == "/OME/Image[1]/@ID"));
}

#[tokio::test]
async fn test_plain_tiff_with_free_text() {
    let file = TiffBuilder::new()
        .page(Page::with_description(FREE_TEXT_DESCRIPTION))
        .write_temp();
    let report = validator().validate_tiff(file.path()).await.unwrap();

    // A readable container with unparseable metadata: violation, not error.
    assert!(!report.is_ome_tiff);
    assert!(!report.is_xsd_valid);
    assert_eq!(report.violations[0].rule, ViolationRule::MalformedDocument);
}

#[tokio::test]
async fn test_tiff_without_description() {
    let file = TiffBuilder::new().page(Page::blank()).write_temp();
    let report = validator().validate_tiff(file.path()).await.unwrap();

    assert!(!report.is_ome_tiff);
    assert!(!report.is_xsd_valid);
    assert_eq!(report.violations[0].rule, ViolationRule::NoEmbeddedMetadata);
}

#[tokio::test]
async fn test_broken_tiff_container() {
    let file = temp_file_with(".tiff", b"MM garbage that is not a real tiff at all");
    let report = validator().validate_tiff(file.path()).await.unwrap();

    assert!(!report.is_ome_tiff);
    assert_eq!(report.violations[0].rule, ViolationRule::MalformedContainer);
    assert!(matches!(report.to_pretty_xml(), Err(XmlError::NoDocument)));
}

#[tokio::test]
async fn test_bigtiff_end_to_end() {
    let file = TiffBuilder::new()
        .bigtiff()
        .page(Page::with_description(VALID_OME))
        .write_temp();
    let report = validator().validate_tiff(file.path()).await.unwrap();
    assert!(report.is_ome_tiff);
    assert!(report.is_xsd_valid);
}

// =============================================================================
// Serialization fidelity
// =============================================================================

#[tokio::test]
async fn test_raw_serialization_round_trip() {
    let file = TiffBuilder::new()
        .page(Page::with_description(VALID_OME))
        .write_temp();
    let report = validator().validate_tiff(file.path()).await.unwrap();

    let raw = report.to_raw_xml().unwrap();
    assert_eq!(raw, VALID_OME);

    let reparsed = xml::parse(&raw).unwrap();
    assert!(report.document().unwrap().structurally_equal(&reparsed));
}

#[tokio::test]
async fn test_pretty_serialization_is_equivalent() {
    let file = temp_file_with(".ome.xml", VALID_OME.as_bytes());
    let report = validator().validate_file(file.path()).await.unwrap();

    let pretty = report.to_pretty_xml().unwrap();
    assert_ne!(pretty, VALID_OME);

    let reparsed = xml::parse(&pretty).unwrap();
    assert!(report.document().unwrap().structurally_equal(&reparsed));
}

// =============================================================================
// Path dispatch
// =============================================================================

#[tokio::test]
async fn test_validate_path_dispatches_on_extension() {
    let tiff = TiffBuilder::new()
        .page(Page::with_description(VALID_OME))
        .write_temp();
    let report = validator().validate_path(tiff.path()).await.unwrap();
    assert_eq!(report.kind, SourceKind::Tiff);
    assert!(report.is_ome_tiff);

    let xml_file = temp_file_with(".ome.xml", VALID_OME.as_bytes());
    let report = validator().validate_path(xml_file.path()).await.unwrap();
    assert_eq!(report.kind, SourceKind::Xml);
    assert!(report.is_xsd_valid);
}

#[tokio::test]
async fn test_tiff_magic_behind_xml_name() {
    // A renamed container still goes through metadata extraction.
    let bytes = TiffBuilder::new()
        .page(Page::with_description(VALID_OME))
        .build();
    let file = temp_file_with(".ome.xml", &bytes);
    let report = validator().validate_path(file.path()).await.unwrap();

    assert_eq!(report.kind, SourceKind::Tiff);
    assert!(report.is_ome_tiff);
    assert!(report.is_xsd_valid, "{:?}", report.violations);
}

#[tokio::test]
async fn test_json_summary() {
    let file = TiffBuilder::new()
        .page(Page::with_description(OME_MISSING_IMAGE_ID))
        .write_temp();
    let report = validator().validate_tiff(file.path()).await.unwrap();

    let json = serde_json::to_value(report.to_summary()).unwrap();
    assert_eq!(json["kind"], "tiff");
    assert_eq!(json["is_ome_tiff"], true);
    assert_eq!(json["is_xsd_valid"], false);
    assert!(!json["violations"].as_array().unwrap().is_empty());
}
