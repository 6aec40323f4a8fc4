use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;

use super::ByteSource;
use crate::error::IoError;

/// File-backed implementation of ByteSource.
///
/// Reads byte ranges from a local file with seek + read. The file size is
/// fetched once on open, and every subsequent range is validated against it.
#[derive(Debug)]
pub struct FileSource {
    file: Mutex<File>,
    size: u64,
    identifier: String,
}

impl FileSource {
    /// Open a file for range reads.
    ///
    /// This stats the file once to determine its size. Returns an error if
    /// the file does not exist or is inaccessible.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let identifier = path.display().to_string();

        let file = File::open(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                IoError::NotFound(identifier.clone())
            } else {
                IoError::File(e.to_string())
            }
        })?;

        let size = file.metadata().map_err(|e| IoError::File(e.to_string()))?.len();

        Ok(Self {
            file: Mutex::new(file),
            size,
            identifier,
        })
    }
}

impl ByteSource for FileSource {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        // Validate range bounds
        if offset + len as u64 > self.size {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size,
            });
        }

        // Handle zero-length reads
        if len == 0 {
            return Ok(Bytes::new());
        }

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);

        file.seek(SeekFrom::Start(offset))
            .map_err(|e| IoError::File(e.to_string()))?;

        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)
            .map_err(|e| IoError::File(e.to_string()))?;

        Ok(Bytes::from(buf))
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
