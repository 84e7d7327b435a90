//! TIFF container parsing for metadata extraction.
//!
//! An OME-TIFF is an ordinary TIFF whose ImageDescription tag carries an
//! OME-XML document instead of free text. This module parses just enough of
//! the container to pull that value out:
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian,
//!   MM = big-endian) in the header; all multi-byte values respect it.
//! - **Classic TIFF vs BigTIFF**: 32-bit vs 64-bit offsets. Both are
//!   handled transparently; microscopy stacks regularly exceed 4GB.
//! - **IFD (Image File Directory)**: the tag table. Multi-page files chain
//!   several; the chain is walked in file order.
//! - **Inline vs offset values**: small values live inside the IFD entry,
//!   larger ones (like an XML document) behind a file offset.

mod description;
mod parser;
mod tags;
mod values;

pub use description::extract_image_description;
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use tags::{FieldType, TiffTag};
pub use values::ValueReader;
