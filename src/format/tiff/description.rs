//! ImageDescription extraction.
//!
//! An OME-TIFF carries its OME-XML document in the ImageDescription tag
//! (270) of an IFD. This module walks the IFD chain and pulls that value
//! out as text, without touching any pixel data.
//!
//! # Multi-page files
//!
//! OME-TIFF stacks routinely contain one IFD per plane. IFDs are scanned in
//! file order and the first one carrying the tag wins; later IFDs are not
//! consulted once a description is found.

use tracing::debug;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{Ifd, TiffHeader, BIGTIFF_HEADER_SIZE};
use super::tags::TiffTag;
use super::values::ValueReader;

/// Maximum number of IFDs to walk (safety limit against offset cycles).
const MAX_IFDS: usize = 10_000;

/// Extract the ImageDescription text from a TIFF file.
///
/// Returns `Ok(None)` if no IFD carries the tag. That is a legitimate
/// outcome (a plain photographic TIFF), distinct from the `Err` cases which
/// all mean the container itself is broken: bad magic, truncated directory,
/// offsets outside the file, or a tag whose type/count disagree with the
/// span it claims.
pub async fn extract_image_description<R: RangeReader>(
    reader: &R,
) -> Result<Option<String>, TiffError> {
    let file_size = reader.size();

    // Read enough for either header flavor; short files surface as
    // FileTooSmall from the header parser.
    let header_len = BIGTIFF_HEADER_SIZE.min(file_size as usize);
    let header_bytes = reader.read_exact_at(0, header_len).await?;
    let header = TiffHeader::parse(&header_bytes, file_size)?;

    debug!(
        file = reader.identifier(),
        bigtiff = header.is_bigtiff,
        "walking IFD chain for ImageDescription"
    );

    let mut offset = header.first_ifd_offset;
    let mut visited = 0usize;

    while offset != 0 {
        if visited >= MAX_IFDS {
            return Err(TiffError::TooManyIfds(MAX_IFDS));
        }
        if offset >= file_size {
            return Err(TiffError::InvalidIfdOffset(offset));
        }

        let ifd = read_ifd_at(reader, &header, offset).await?;

        if let Some(entry) = ifd.get_entry_by_tag(TiffTag::ImageDescription) {
            debug!(
                file = reader.identifier(),
                ifd_index = visited,
                count = entry.count,
                "found ImageDescription"
            );
            let values = ValueReader::new(reader, &header);
            let text = values.read_text(entry).await?;
            return Ok(Some(text));
        }

        offset = ifd.next_ifd_offset;
        visited += 1;
    }

    debug!(
        file = reader.identifier(),
        ifds = visited,
        "no ImageDescription tag in any IFD"
    );
    Ok(None)
}

/// Read and parse one IFD, in two bounded reads: the entry count, then the
/// full directory.
async fn read_ifd_at<R: RangeReader>(
    reader: &R,
    header: &TiffHeader,
    offset: u64,
) -> Result<Ifd, TiffError> {
    let count_size = header.ifd_count_size();
    let count_bytes = reader
        .read_exact_at(offset, count_size)
        .await
        .map_err(truncated(offset))?;

    let entry_count = if header.is_bigtiff {
        header.byte_order.read_u64(&count_bytes)
    } else {
        header.byte_order.read_u16(&count_bytes) as u64
    };

    // A directory cannot hold more entries than the file has bytes; reject
    // absurd counts before they overflow the size computation.
    if entry_count > reader.size() / header.ifd_entry_size() as u64 {
        return Err(TiffError::InvalidIfdOffset(offset));
    }

    let ifd_size = Ifd::calculate_size(entry_count, header);
    let ifd_bytes = reader
        .read_exact_at(offset, ifd_size)
        .await
        .map_err(truncated(offset))?;

    Ifd::parse(&ifd_bytes, header)
}

/// Map a bounds failure while reading a directory to the offset that
/// claimed it, which is the actually useful diagnostic.
fn truncated(offset: u64) -> impl Fn(crate::error::IoError) -> TiffError {
    move |e| match e {
        crate::error::IoError::RangeOutOfBounds { .. } => TiffError::InvalidIfdOffset(offset),
        other => TiffError::Io(other),
    }
}

// =============================================================================
// Tests
// =============================================================================
//
// End-to-end extraction tests (multi-IFD, both endians, BigTIFF) live in
// tests/integration/tiff_tests.rs with the shared TIFF builder.
