use bytes::Bytes;

use super::ByteSource;
use crate::error::IoError;

/// In-memory implementation of ByteSource.
///
/// Serves ranges out of a byte buffer with zero-copy slicing. Useful for
/// documents that are already resident and as a test double for the scanner
/// and reader.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
    identifier: String,
}

impl MemorySource {
    /// Wrap a byte buffer as a source. The identifier defaults to `"memory"`.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            identifier: "memory".to_string(),
        }
    }

    /// Wrap a byte buffer with an explicit identifier.
    pub fn with_identifier(data: impl Into<Bytes>, identifier: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            identifier: identifier.into(),
        }
    }
}

impl ByteSource for MemorySource {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        if offset + len as u64 > self.data.len() as u64 {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.data.len() as u64,
            });
        }

        if len == 0 {
            return Ok(Bytes::new());
        }

        let start = offset as usize;
        Ok(self.data.slice(start..start + len))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
