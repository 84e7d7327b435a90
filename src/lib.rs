//! OME Validator - schema validation for OME-XML microscopy metadata.
//!
//! OME-XML is the metadata format of the Open Microscopy Environment; an
//! OME-TIFF is an ordinary TIFF container carrying an OME-XML document in
//! its ImageDescription tag. This crate validates both forms against the
//! OME schema and reports every violation it finds, in document order.
//!
//! # Architecture
//!
//! - **io**: positioned byte-range reading over input files
//! - **format**: TIFF container parsing and metadata extraction
//! - **xml**: well-formedness parsing, document tree, serialization views
//! - **schema**: XSD compilation and validation
//! - **report**: the validator entry points and per-file reports
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use ome_validator::report::OmeValidator;
//!
//! let validator = OmeValidator::bundled()?;
//! let report = validator.validate_tiff(Path::new("scan.ome.tiff")).await?;
//!
//! if report.is_xsd_valid {
//!     println!("File OK");
//! } else {
//!     for violation in &report.violations {
//!         println!("{}", violation);
//!     }
//! }
//! ```
//!
//! Schema violations are data, not errors: any structurally readable input
//! produces a report. Only I/O failures surface as `Err`.

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod report;
pub mod schema;
pub mod xml;

pub use error::{IoError, SchemaError, TiffError, XmlError};
pub use report::{OmeValidator, SchemaViolation, SourceKind, ViolationRule, XmlReport};
