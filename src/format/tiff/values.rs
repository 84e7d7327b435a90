//! TIFF tag value reading.
//!
//! Values can be stored either inline in the IFD entry (for small values)
//! or at an offset in the file (for larger values like an embedded XML
//! document, which is always offset-indirected in practice).

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{IfdEntry, TiffHeader};

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values from a TIFF file.
///
/// Combines a [`RangeReader`] with the parsed header so values are read
/// respecting the file's byte order and offset width.
pub struct ValueReader<'a, R: RangeReader> {
    reader: &'a R,
    header: &'a TiffHeader,
}

impl<'a, R: RangeReader> ValueReader<'a, R> {
    /// Create a new ValueReader.
    pub fn new(reader: &'a R, header: &'a TiffHeader) -> Self {
        Self { reader, header }
    }

    /// Read the raw bytes of an IFD entry's value.
    ///
    /// For inline values, returns the bytes from the entry itself. For
    /// offset values, checks the claimed span against the file bounds and
    /// fetches it. A count/type combination whose size overflows, or an
    /// offset whose span leaves the file, is a malformed container.
    pub async fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline {
            return Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ));
        }

        let offset = entry.value_offset(self.header.byte_order);
        let end = offset.checked_add(size);
        if !end.is_some_and(|end| end <= self.reader.size()) {
            return Err(TiffError::InvalidTagValue {
                tag: "value",
                message: format!(
                    "value span {}..{} exceeds file size {}",
                    offset,
                    offset.saturating_add(size),
                    self.reader.size()
                ),
            });
        }

        let bytes = self.reader.read_exact_at(offset, size as usize).await?;
        Ok(bytes)
    }

    /// Read an entry's value as text.
    ///
    /// Accepts ASCII, BYTE and UNDEFINED field types. The value is decoded
    /// as UTF-8 (lossily, so a stray high byte does not sink the whole
    /// document) and trailing NUL terminators are stripped.
    pub async fn read_text(&self, entry: &IfdEntry) -> Result<String, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if !field_type.is_text_like() {
            return Err(TiffError::InvalidTagValue {
                tag: "ImageDescription",
                message: format!("expected a text-like type, got {:?}", field_type),
            });
        }

        let bytes = self.read_bytes(entry).await?;

        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

// =============================================================================
// Tests
// =============================================================================
