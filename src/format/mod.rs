//! Container format handling.
//!
//! Currently only TIFF needs real parsing; standalone XML inputs bypass
//! this layer entirely and go straight to the XML parser.

pub mod tiff;

pub use tiff::{extract_image_description, ByteOrder, TiffHeader};

/// Check whether a byte prefix looks like a TIFF header: II/MM magic
/// followed by version 42 (classic) or 43 (BigTIFF) in the matching order.
///
/// This is a cheap sniff, not validation; [`TiffHeader::parse`] does the
/// real checking. Used to catch TIFF payloads hiding behind non-TIFF
/// file names.
pub fn is_tiff_header(bytes: &[u8]) -> bool {
    match bytes {
        [0x49, 0x49, version, 0x00, ..] => *version == 42 || *version == 43,
        [0x4D, 0x4D, 0x00, version, ..] => *version == 42 || *version == 43,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_tiff_header() {
        assert!(is_tiff_header(&[0x49, 0x49, 0x2A, 0x00]));
        assert!(is_tiff_header(&[0x4D, 0x4D, 0x00, 0x2A]));
        assert!(is_tiff_header(&[0x49, 0x49, 0x2B, 0x00]));
        assert!(is_tiff_header(&[0x4D, 0x4D, 0x00, 0x2B]));
        assert!(!is_tiff_header(b"<?xm"));
        assert!(!is_tiff_header(b"IIabc"));
        assert!(!is_tiff_header(&[0x49, 0x49]));
    }
}
