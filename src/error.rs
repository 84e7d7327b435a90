use thiserror::Error;

/// I/O errors that can occur when reading input files.
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// File does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// File exists but could not be read
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    /// Requested range exceeds file bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },
}

impl IoError {
    /// Convert a std I/O error into an [`IoError`], keeping the path for context.
    pub fn from_std(path: &std::path::Path, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(path.display().to_string()),
            _ => IoError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Errors that can occur when parsing TIFF containers.
///
/// All variants except `Io` indicate a structurally broken container.
/// They are recoverable at the report level: the orchestrator degrades them
/// into violations rather than propagating them to the caller.
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// IFD chain is longer than the safety limit (likely a cycle)
    #[error("IFD chain exceeds {0} directories")]
    TooManyIfds(usize),

    /// Tag has unexpected type or count for the requested read
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Errors that can occur when parsing XML text into a document tree.
#[derive(Debug, Clone, Error)]
pub enum XmlError {
    /// The text is not well-formed XML
    #[error("Malformed XML at byte {position}: {reason}")]
    MalformedXml { position: u64, reason: String },

    /// A serialization view was requested on a report with no parsed tree
    #[error("No document: the report holds no parsed tree")]
    NoDocument,
}

/// Errors that can occur when loading or compiling the XSD schema resource.
///
/// These are environment-level failures: without a usable schema the
/// process cannot validate anything, so they surface at validator
/// construction rather than inside a report.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// I/O error while reading the schema file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// The schema document itself is not well-formed XML
    #[error("Schema is not well-formed XML: {0}")]
    Malformed(#[from] XmlError),

    /// The schema root is not an xsd:schema element
    #[error("Not an XSD document: root element is {0}")]
    NotASchema(String),

    /// The schema declares no target namespace
    #[error("Schema has no targetNamespace attribute")]
    MissingTargetNamespace,

    /// A schema construct required a name it did not carry
    #[error("Schema element <{element}> is missing its {attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// A type reference could not be resolved
    #[error("Unknown type reference: {0}")]
    UnknownType(String),
}
