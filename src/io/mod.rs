//! Byte-range I/O over validation inputs.
//!
//! The [`RangeReader`] trait abstracts positioned reads so the TIFF layer
//! never assumes a local file; [`FileRangeReader`] is the on-disk
//! implementation the CLI uses.

mod file_reader;
mod range_reader;

pub use file_reader::FileRangeReader;
pub use range_reader::{
    read_u16_be, read_u16_le, read_u32_be, read_u32_le, read_u64_be, read_u64_le, RangeReader,
};
