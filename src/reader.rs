//! The reader facade: open a source, then read planes and regions.
//!
//! Opening runs the whole setup pipeline once:
//!
//! 1. Probe the header and confirm the document is an OME-XML container.
//! 2. Ask the [`OmeSupport`] handle for a metadata parser and bind
//!    per-series dimensions from the document.
//! 3. Scan for series markers and pixel-block offsets to build the
//!    immutable series index.
//!
//! After that, reads are pure lookups: a plane read slices the block span
//! out of the source, decodes it, and caches the result; a region read
//! crops rows out of a decoded plane.

use bytes::Bytes;
use tracing::debug;

use crate::cache::{PlaneCache, PlaneKey};
use crate::error::{FormatError, ReadError};
use crate::format::{build_index, copy_region, decode_plane, detect_format, Region, Series};
use crate::io::ByteSource;
use crate::meta::{MetadataStore, OmeSupport};

// =============================================================================
// Reader
// =============================================================================

/// Reader for OME-XML pixel containers.
///
/// Generic over the [`ByteSource`] so the same reader serves files and
/// in-memory documents. All read methods take `&self`; a reader can be
/// shared across threads and the plane cache stays coherent.
pub struct OmeXmlReader<S: ByteSource> {
    source: S,
    series: Vec<Series>,
    cache: PlaneCache,
}

impl<S: ByteSource> OmeXmlReader<S> {
    /// Open a source with the built-in metadata parser.
    pub fn open(source: S) -> Result<Self, FormatError> {
        Self::open_with(source, &OmeSupport::detect())
    }

    /// Open a source with an explicit support handle.
    ///
    /// Fails with [`FormatError::NotOmeXml`] when the header probe rejects
    /// the document, and with [`FormatError::MissingOmeSupport`] when the
    /// handle carries no parser.
    pub fn open_with(source: S, support: &OmeSupport) -> Result<Self, FormatError> {
        detect_format(&source)?;

        let metadata = support.parser()?.parse_source(&source)?;
        let series = build_index(&source, metadata.as_ref())?;

        debug!(
            identifier = source.identifier(),
            series = series.len(),
            "opened OME-XML container"
        );

        Ok(Self {
            source,
            series,
            cache: PlaneCache::new(),
        })
    }

    /// Replace the plane cache with one of the given byte budget.
    /// A budget of zero disables plane caching.
    pub fn with_plane_cache_capacity(mut self, bytes: usize) -> Self {
        self.cache = PlaneCache::with_capacity(bytes);
        self
    }

    /// Identifier of the underlying source.
    pub fn identifier(&self) -> &str {
        self.source.identifier()
    }

    /// Number of series in the file.
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// One series' bound metadata and offsets.
    pub fn series(&self, series: usize) -> Option<&Series> {
        self.series.get(series)
    }

    /// All series, in file order.
    pub fn all_series(&self) -> &[Series] {
        &self.series
    }

    /// The plane cache, for inspection.
    pub fn plane_cache(&self) -> &PlaneCache {
        &self.cache
    }

    /// Publish one geometry record per series to a metadata sink.
    pub fn populate_store(&self, store: &mut dyn MetadataStore) {
        for (i, series) in self.series.iter().enumerate() {
            store.store_series(&series.geometry(i));
        }
    }

    /// Read and decode one whole plane.
    ///
    /// The result is exactly `plane_len` bytes of raw samples in file byte
    /// order. Decoded planes are cached, so repeated reads of the same
    /// plane hit memory.
    pub fn read_plane(&self, series: usize, plane: usize) -> Result<Bytes, ReadError> {
        let info = self.series_info(series)?;
        let start = info.offset(plane).ok_or(ReadError::InvalidPlane {
            series,
            plane,
            count: info.plane_count(),
        })?;

        let key = PlaneKey::new(series, plane);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let end = self.span_end(series, info, plane, start);
        let span = self.source.read_exact_at(start, (end - start) as usize)?;
        let decoded = decode_plane(&span, start, info.compression, info.plane_len())?;

        let data = Bytes::from(decoded);
        self.cache.put(key, data.clone());
        Ok(data)
    }

    /// Read a rectangular region of one plane into `dest`.
    ///
    /// Output rows are contiguous with no padding, `region.width *
    /// bytes_per_pixel` bytes each. `dest` must hold at least the region's
    /// byte length; extra trailing bytes are left untouched.
    pub fn read_region(
        &self,
        series: usize,
        plane: usize,
        region: Region,
        dest: &mut [u8],
    ) -> Result<(), ReadError> {
        let (width, height, bytes_per_pixel) = {
            let info = self.series_info(series)?;
            (info.width, info.height, info.bytes_per_pixel())
        };

        let data = self.read_plane(series, plane)?;
        copy_region(&data, width, height, bytes_per_pixel, region, dest)
    }

    fn series_info(&self, series: usize) -> Result<&Series, ReadError> {
        self.series.get(series).ok_or(ReadError::InvalidSeries {
            series,
            count: self.series.len(),
        })
    }

    /// A block's span ends at the next block in the same series, at the
    /// first block of the next series, or at end of file.
    fn span_end(&self, series: usize, info: &Series, plane: usize, start: u64) -> u64 {
        if let Some(next) = info.offset(plane + 1) {
            return next;
        }
        self.series
            .get(series + 1)
            .and_then(|next| next.offset(0))
            .filter(|&next| next > start)
            .unwrap_or_else(|| self.source.size())
    }
}

impl<S: ByteSource> std::fmt::Debug for OmeXmlReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OmeXmlReader")
            .field("identifier", &self.identifier())
            .field("series", &self.series.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
