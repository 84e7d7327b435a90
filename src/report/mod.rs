//! Validation reports and the validator entry points.
//!
//! [`OmeValidator`] is the public face of the crate: construct it once
//! against a schema, then run files through it. Every structurally readable
//! input yields an [`XmlReport`], valid or not; only I/O failures surface
//! as errors.

mod violation;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{IoError, SchemaError, TiffError, XmlError};
use crate::format::tiff::extract_image_description;
use crate::format::is_tiff_header;
use crate::io::FileRangeReader;
use crate::schema::{self, validate_document, Schema};
use crate::xml::{self, Document};

pub use violation::{SchemaViolation, ViolationRule};

// =============================================================================
// Source classification
// =============================================================================

/// What kind of input a path refers to, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A TIFF container; metadata is extracted from ImageDescription
    Tiff,
    /// A standalone XML document
    Xml,
}

impl SourceKind {
    /// Classify a path: `.tif`/`.tiff` (any case) is TIFF, everything else
    /// is treated as standalone XML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff") => {
                SourceKind::Tiff
            }
            _ => SourceKind::Xml,
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// The outcome of validating one input file.
#[derive(Debug, Clone)]
pub struct XmlReport {
    /// Path the report was produced from
    pub source: PathBuf,
    pub kind: SourceKind,
    /// True when the metadata parsed and passed every schema check
    pub is_xsd_valid: bool,
    /// True when the input is a TIFF whose ImageDescription parsed as XML
    pub is_ome_tiff: bool,
    /// Every violation found, in document order
    pub violations: Vec<SchemaViolation>,
    document: Option<Document>,
}

impl XmlReport {
    fn new(source: &Path, kind: SourceKind) -> Self {
        XmlReport {
            source: source.to_path_buf(),
            kind,
            is_xsd_valid: false,
            is_ome_tiff: false,
            violations: Vec::new(),
            document: None,
        }
    }

    /// The parsed metadata tree, when the input had one.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Serialize the held document exactly as parsed.
    ///
    /// Fails with [`XmlError::NoDocument`] when the input never yielded a
    /// parsed tree.
    pub fn to_raw_xml(&self) -> Result<String, XmlError> {
        self.document
            .as_ref()
            .map(xml::to_raw_xml)
            .ok_or(XmlError::NoDocument)
    }

    /// Serialize the held document re-indented for reading.
    pub fn to_pretty_xml(&self) -> Result<String, XmlError> {
        self.document
            .as_ref()
            .map(xml::to_pretty_xml)
            .ok_or(XmlError::NoDocument)
    }

    /// Multi-line human-readable summary: verdict line plus one line per
    /// violation.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{}: {}\n",
            self.source.display(),
            if self.is_xsd_valid { "valid" } else { "invalid" }
        );
        if self.kind == SourceKind::Tiff {
            out.push_str(&format!(
                "  OME-TIFF: {}\n",
                if self.is_ome_tiff { "yes" } else { "no" }
            ));
        }
        for violation in &self.violations {
            out.push_str(&format!("  {}\n", violation));
        }
        out
    }

    /// JSON-serializable view of the report.
    pub fn to_summary(&self) -> ReportSummary<'_> {
        ReportSummary {
            source: &self.source,
            kind: self.kind,
            is_xsd_valid: self.is_xsd_valid,
            is_ome_tiff: self.is_ome_tiff,
            violations: &self.violations,
        }
    }
}

/// Serializable projection of an [`XmlReport`] (the document tree itself is
/// not serialized; use the XML views for that).
#[derive(Debug, Serialize)]
pub struct ReportSummary<'a> {
    pub source: &'a Path,
    pub kind: SourceKind,
    pub is_xsd_valid: bool,
    pub is_ome_tiff: bool,
    pub violations: &'a [SchemaViolation],
}

// =============================================================================
// Validator
// =============================================================================

/// Validates OME-XML metadata, standalone or embedded in TIFF containers.
///
/// Holds a compiled schema; cloning is cheap and clones share it.
#[derive(Clone)]
pub struct OmeValidator {
    schema: Arc<Schema>,
}

impl OmeValidator {
    /// Construct against the bundled OME schema (compiled once per
    /// process).
    pub fn bundled() -> Result<Self, SchemaError> {
        Ok(OmeValidator {
            schema: schema::bundled()?,
        })
    }

    /// Construct against an already-compiled schema.
    pub fn with_schema(schema: Arc<Schema>) -> Self {
        OmeValidator { schema }
    }

    /// Construct against a schema loaded from a file.
    pub fn from_schema_file(path: &Path) -> Result<Self, SchemaError> {
        Ok(OmeValidator {
            schema: Arc::new(schema::from_file(path)?),
        })
    }

    /// The schema this validator checks against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate a file, dispatching on its extension: TIFF containers go
    /// through metadata extraction, everything else is read as XML text.
    /// A TIFF payload behind a non-TIFF name is still caught by the magic
    /// sniff in [`Self::validate_file`].
    pub async fn validate_path(&self, path: &Path) -> Result<XmlReport, IoError> {
        match SourceKind::from_path(path) {
            SourceKind::Tiff => self.validate_tiff(path).await,
            SourceKind::Xml => self.validate_file(path).await,
        }
    }

    /// Validate a standalone XML file.
    ///
    /// A file whose bytes start with TIFF magic is routed through container
    /// extraction instead, whatever its name says. An XML document can never
    /// begin with `II*`/`MM*`, so the sniff cannot misfire.
    pub async fn validate_file(&self, path: &Path) -> Result<XmlReport, IoError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| IoError::from_std(path, &e))?;

        if is_tiff_header(&bytes) {
            debug!(path = %path.display(), "TIFF magic behind a non-TIFF name");
            return self.validate_tiff(path).await;
        }

        let mut report = XmlReport::new(path, SourceKind::Xml);
        match xml::decode_text(&bytes).and_then(|text| xml::parse(&text)) {
            Ok(doc) => self.check_document(doc, &mut report),
            Err(err) => report.violations.push(malformed_document(&err)),
        }

        info!(path = %path.display(), valid = report.is_xsd_valid, "validated XML file");
        Ok(report)
    }

    /// Validate the OME-XML metadata embedded in a TIFF container.
    ///
    /// Broken containers and containers without embedded metadata produce
    /// invalid reports, not errors; only I/O failures propagate.
    pub async fn validate_tiff(&self, path: &Path) -> Result<XmlReport, IoError> {
        let reader = FileRangeReader::open(path)?;
        let mut report = XmlReport::new(path, SourceKind::Tiff);

        let description = match extract_image_description(&reader).await {
            Ok(description) => description,
            Err(TiffError::Io(io)) => return Err(io),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "broken TIFF container");
                report.violations.push(
                    SchemaViolation::new(
                        ViolationRule::MalformedContainer,
                        path.display().to_string(),
                        err.to_string(),
                    ),
                );
                return Ok(report);
            }
        };

        let Some(text) = description else {
            report.violations.push(SchemaViolation::new(
                ViolationRule::NoEmbeddedMetadata,
                path.display().to_string(),
                "TIFF has no ImageDescription tag".to_string(),
            ));
            return Ok(report);
        };

        match xml::parse(&text) {
            Ok(doc) => {
                // The description parsed as XML: this is an OME-TIFF,
                // whether or not the metadata is schema-valid.
                report.is_ome_tiff = true;
                self.check_document(doc, &mut report);
            }
            Err(err) => report.violations.push(malformed_document(&err)),
        }

        info!(
            path = %path.display(),
            ome_tiff = report.is_ome_tiff,
            valid = report.is_xsd_valid,
            "validated TIFF file"
        );
        Ok(report)
    }

    /// Validate already-parsed or in-memory XML text. Useful for callers
    /// that hold the metadata themselves.
    pub fn validate_text(&self, source: &Path, text: &str) -> XmlReport {
        let mut report = XmlReport::new(source, SourceKind::Xml);
        match xml::parse(text) {
            Ok(doc) => self.check_document(doc, &mut report),
            Err(err) => report.violations.push(malformed_document(&err)),
        }
        report
    }

    fn check_document(&self, doc: Document, report: &mut XmlReport) {
        let outcome = validate_document(&doc, &self.schema);
        report.is_xsd_valid = outcome.is_valid();
        report.violations.extend(outcome.violations);
        report.document = Some(doc);
    }
}

fn malformed_document(err: &XmlError) -> SchemaViolation {
    let location = match err {
        XmlError::MalformedXml { position, .. } => format!("byte {}", position),
        XmlError::NoDocument => String::from("document"),
    };
    SchemaViolation::new(ViolationRule::MalformedDocument, location, err.to_string())
}

// =============================================================================
// Tests
// =============================================================================
