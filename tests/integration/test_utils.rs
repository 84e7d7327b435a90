//! Shared fixtures: a TIFF builder and sample OME-XML documents.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

// =============================================================================
// Sample metadata
// =============================================================================

pub const OME_NS: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06";

/// A complete, schema-valid OME-XML document.
pub const VALID_OME: &str = r#"<?xml version="1.0" encoding="UTF-8"?><OME xmlns="http://www.openmicroscopy.org/Schemas/OME/2016-06" Creator="test-suite"><Image ID="Image:0" Name="series-1"><AcquisitionDate>2024-01-15T10:30:00</AcquisitionDate><Pixels ID="Pixels:0" DimensionOrder="XYZCT" Type="uint16" SizeX="512" SizeY="512" SizeZ="1" SizeC="2" SizeT="1" PhysicalSizeX="0.325" PhysicalSizeY="0.325"><Channel ID="Channel:0:0" SamplesPerPixel="1"/><Channel ID="Channel:0:1" SamplesPerPixel="1"/></Pixels></Image></OME>"#;

/// An OME-XML document whose Image is missing its required ID.
pub const OME_MISSING_IMAGE_ID: &str = r#"<?xml version="1.0"?><OME xmlns="http://www.openmicroscopy.org/Schemas/OME/2016-06"><Image Name="anonymous"><Pixels ID="Pixels:0" DimensionOrder="XYZCT" Type="uint8" SizeX="4" SizeY="4" SizeZ="1" SizeC="1" SizeT="1"/></Image></OME>"#;

/// Free text, as found in an ordinary photographic TIFF's description.
pub const FREE_TEXT_DESCRIPTION: &str = "Captured with an ordinary camera, not a microscope";

// =============================================================================
// TIFF builder
// =============================================================================

/// One page (IFD) of a synthetic TIFF.
#[derive(Default)]
pub struct Page {
    pub width: Option<u32>,
    pub description: Option<Vec<u8>>,
}

impl Page {
    pub fn blank() -> Self {
        Page {
            width: Some(64),
            description: None,
        }
    }

    pub fn with_description(text: &str) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0); // ASCII values are NUL-terminated
        Page {
            width: Some(64),
            description: Some(bytes),
        }
    }
}

/// Builds classic TIFF and BigTIFF byte streams for tests, in either byte
/// order, with any number of chained IFDs.
pub struct TiffBuilder {
    big_endian: bool,
    bigtiff: bool,
    pages: Vec<Page>,
}

impl TiffBuilder {
    pub fn new() -> Self {
        TiffBuilder {
            big_endian: false,
            bigtiff: false,
            pages: Vec::new(),
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn bigtiff(mut self) -> Self {
        self.bigtiff = true;
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        if self.bigtiff {
            self.build_bigtiff()
        } else {
            self.build_classic()
        }
    }

    /// Write the bytes to a temp file with a `.ome.tiff` suffix.
    pub fn write_temp(&self) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".ome.tiff")
            .tempfile()
            .unwrap();
        file.write_all(&self.build()).unwrap();
        file.flush().unwrap();
        file
    }

    fn w16(&self, out: &mut Vec<u8>, v: u16) {
        out.extend_from_slice(&if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        });
    }

    fn w32(&self, out: &mut Vec<u8>, v: u32) {
        out.extend_from_slice(&if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        });
    }

    fn w64(&self, out: &mut Vec<u8>, v: u64) {
        out.extend_from_slice(&if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        });
    }

    fn patch32(&self, out: &mut [u8], pos: usize, v: u32) {
        let bytes = if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        };
        out[pos..pos + 4].copy_from_slice(&bytes);
    }

    fn patch64(&self, out: &mut [u8], pos: usize, v: u64) {
        let bytes = if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        };
        out[pos..pos + 8].copy_from_slice(&bytes);
    }

    fn build_classic(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(if self.big_endian {
            &[0x4D, 0x4D]
        } else {
            &[0x49, 0x49]
        });
        self.w16(&mut out, 42);
        let mut next_ptr_pos = out.len();
        self.w32(&mut out, 0); // first IFD offset, patched below

        for page in &self.pages {
            let ifd_offset = out.len() as u32;
            self.patch32(&mut out, next_ptr_pos, ifd_offset);

            let mut entries = 0u16;
            if page.width.is_some() {
                entries += 1;
            }
            if page.description.is_some() {
                entries += 1;
            }

            let ifd_size = 2 + entries as usize * 12 + 4;
            let data_offset = ifd_offset as usize + ifd_size;

            self.w16(&mut out, entries);

            // Entries in ascending tag order: 256 (ImageWidth), 270.
            if let Some(width) = page.width {
                self.w16(&mut out, 256);
                self.w16(&mut out, 4); // LONG
                self.w32(&mut out, 1);
                self.w32(&mut out, width);
            }
            if let Some(description) = &page.description {
                self.w16(&mut out, 270);
                self.w16(&mut out, 2); // ASCII
                self.w32(&mut out, description.len() as u32);
                if description.len() <= 4 {
                    let mut inline = description.clone();
                    inline.resize(4, 0);
                    out.extend_from_slice(&inline);
                } else {
                    self.w32(&mut out, data_offset as u32);
                }
            }

            next_ptr_pos = out.len();
            self.w32(&mut out, 0); // next IFD, patched by the following page

            if let Some(description) = &page.description {
                if description.len() > 4 {
                    out.extend_from_slice(description);
                }
            }
        }

        out
    }

    fn build_bigtiff(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(if self.big_endian {
            &[0x4D, 0x4D]
        } else {
            &[0x49, 0x49]
        });
        self.w16(&mut out, 43);
        self.w16(&mut out, 8); // offset byte size
        self.w16(&mut out, 0); // reserved
        let mut next_ptr_pos = out.len();
        self.w64(&mut out, 0); // first IFD offset, patched below

        for page in &self.pages {
            let ifd_offset = out.len() as u64;
            self.patch64(&mut out, next_ptr_pos, ifd_offset);

            let mut entries = 0u64;
            if page.width.is_some() {
                entries += 1;
            }
            if page.description.is_some() {
                entries += 1;
            }

            let ifd_size = 8 + entries as usize * 20 + 8;
            let data_offset = ifd_offset as usize + ifd_size;

            self.w64(&mut out, entries);

            if let Some(width) = page.width {
                self.w16(&mut out, 256);
                self.w16(&mut out, 4); // LONG
                self.w64(&mut out, 1);
                let mut value = Vec::new();
                self.w32(&mut value, width);
                value.resize(8, 0);
                out.extend_from_slice(&value);
            }
            if let Some(description) = &page.description {
                self.w16(&mut out, 270);
                self.w16(&mut out, 2); // ASCII
                self.w64(&mut out, description.len() as u64);
                if description.len() <= 8 {
                    let mut inline = description.clone();
                    inline.resize(8, 0);
                    out.extend_from_slice(&inline);
                } else {
                    self.w64(&mut out, data_offset as u64);
                }
            }

            next_ptr_pos = out.len();
            self.w64(&mut out, 0);

            if let Some(description) = &page.description {
                if description.len() > 8 {
                    out.extend_from_slice(description);
                }
            }
        }

        out
    }
}

/// Write arbitrary bytes to a temp file with the given suffix.
pub fn temp_file_with(suffix: &str, data: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}
