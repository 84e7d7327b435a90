//! Local-file implementation of [`RangeReader`].
//!
//! Validation inputs are single files on disk. Reads are served with
//! positioned reads so a reader can be shared across concurrent tasks
//! without any seek coordination.

use std::fs::File;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::IoError;
use crate::io::RangeReader;

/// Reads byte ranges from a local file.
pub struct FileRangeReader {
    file: File,
    size: u64,
    identifier: String,
}

impl FileRangeReader {
    /// Open a file for range reading.
    ///
    /// Fails with [`IoError::NotFound`] if the path does not exist, or
    /// [`IoError::Read`] for any other open/stat failure.
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let file = File::open(path).map_err(|e| IoError::from_std(path, &e))?;
        let size = file
            .metadata()
            .map_err(|e| IoError::from_std(path, &e))?
            .len();

        debug!(path = %path.display(), size, "opened file for range reads");

        Ok(Self {
            file,
            size,
            identifier: path.display().to_string(),
        })
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_exact_at(buf, offset)
        }
        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            let mut read = 0;
            while read < buf.len() {
                let n = self.file.seek_read(&mut buf[read..], offset + read as u64)?;
                if n == 0 {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "failed to fill whole buffer",
                    ));
                }
                read += n;
            }
            Ok(())
        }
    }
}

#[async_trait]
impl RangeReader for FileRangeReader {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let end = offset.checked_add(len as u64);
        if end.is_none() || end.unwrap() > self.size {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size,
            });
        }

        let mut buf = vec![0u8; len];
        self.read_at(&mut buf, offset).map_err(|e| IoError::Read {
            path: self.identifier.clone(),
            message: e.to_string(),
        })?;

        Ok(Bytes::from(buf))
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
