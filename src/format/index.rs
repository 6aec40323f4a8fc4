//! Series/offset index construction.
//!
//! Pixel blocks sit at unknown byte offsets inside the document, so the
//! index is built by scanning, in four phases:
//!
//! 1. Find every `BigEndian` attribute; each occurrence marks one series
//!    and carries its byte order.
//! 2. From each series' marker position, find the first accepted `<Bin`
//!    block; that offset anchors the series.
//! 3. From the anchor, discover the remaining block offsets, skipping an
//!    estimate of each plane's encoded size between scan windows and
//!    falling back to an exhaustive pass when the estimate overshoots.
//! 4. Bind dimensions and pixel type from the metadata accessor and probe
//!    the first block for a `Compression` attribute.
//!
//! The finished index is immutable for the life of the reader.

use tracing::{debug, warn};

use crate::error::FormatError;
use crate::io::ByteSource;
use crate::meta::{ByteOrder, Compression, MetadataRetrieve, PixelType, SeriesGeometry};
use crate::scan::MarkerScanner;

// =============================================================================
// Constants
// =============================================================================

/// Per-series byte-order attribute marker.
const ENDIAN_MARKER: &[u8] = b"BigEndian";

/// Carry length for the byte-order scan.
const ENDIAN_CARRY: usize = 9;

/// Bytes probed past a `BigEndian` match to parse its value.
const ENDIAN_VALUE_PROBE: usize = 16;

/// Pixel-block element marker.
const BIN_MARKER: &[u8] = b"<Bin";

/// `<Bin` occurrences that are references, not inline pixel blocks.
const BIN_EXCLUDES: &[&[u8]] = &[b"<Bin:External", b"<Bin:BinaryFile"];

/// Carry length for the first-block scan.
const FIRST_BIN_CARRY: usize = 14;

/// Carry length for the subsequent-blocks scan.
const SEARCH_BIN_CARRY: usize = 20;

/// Bytes probed at a series' first block for its compression attribute.
const COMPRESSION_PROBE: usize = 256;

/// Compression attribute, as literal text.
const COMPRESSION_ATTR: &str = "Compression=\"";

// =============================================================================
// Series
// =============================================================================

/// One logical image dataset within the file: bound metadata plus the
/// ordered offsets of its pixel blocks.
#[derive(Debug, Clone)]
pub struct Series {
    /// Plane width in pixels
    pub width: u32,
    /// Plane height in pixels
    pub height: u32,
    /// Declared Z dimension
    pub size_z: u32,
    /// Declared channel count
    pub size_c: u32,
    /// Declared timepoint count
    pub size_t: u32,
    /// Dimension-order label from the document
    pub dimension_order: String,
    /// Sample type
    pub pixel_type: PixelType,
    /// Sample byte order
    pub byte_order: ByteOrder,
    /// Payload compression scheme
    pub compression: Compression,
    /// Strictly increasing block offsets; frozen after the index build.
    offsets: Vec<u64>,
    /// File position of the series' `BigEndian` attribute.
    marker_pos: u64,
}

impl Series {
    /// Number of planes actually located in the file.
    ///
    /// May be smaller than [`declared_planes`](Series::declared_planes)
    /// when the document's dimensions overstate its contents.
    pub fn plane_count(&self) -> usize {
        self.offsets.len()
    }

    /// Plane count implied by the declared Z*C*T dimensions.
    pub fn declared_planes(&self) -> usize {
        self.size_z as usize * self.size_c as usize * self.size_t as usize
    }

    /// Bytes per sample.
    pub fn bytes_per_pixel(&self) -> usize {
        self.pixel_type.bytes_per_pixel()
    }

    /// Size of one decoded plane in bytes.
    pub fn plane_len(&self) -> usize {
        self.width as usize * self.height as usize * self.bytes_per_pixel()
    }

    /// Absolute offset of a plane's pixel block.
    pub fn offset(&self, plane: usize) -> Option<u64> {
        self.offsets.get(plane).copied()
    }

    /// All block offsets, in file order.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// File position of the `BigEndian` attribute that marked this series.
    pub fn marker_position(&self) -> u64 {
        self.marker_pos
    }

    /// Snapshot of this series as a geometry record.
    pub fn geometry(&self, series: usize) -> SeriesGeometry {
        SeriesGeometry {
            series,
            width: self.width,
            height: self.height,
            size_z: self.size_z,
            size_c: self.size_c,
            size_t: self.size_t,
            dimension_order: self.dimension_order.clone(),
            pixel_type: self.pixel_type,
            bytes_per_pixel: self.bytes_per_pixel(),
            byte_order: self.byte_order,
            compression: self.compression,
            declared_planes: self.declared_planes(),
            plane_count: self.plane_count(),
        }
    }
}

// =============================================================================
// Index Build
// =============================================================================

/// Build the full series index for an opened document.
///
/// Any scan that cannot locate a required marker fails the whole build;
/// series with fewer blocks than declared planes are kept with the reduced
/// count.
pub fn build_index<S: ByteSource + ?Sized>(
    source: &S,
    metadata: &dyn MetadataRetrieve,
) -> Result<Vec<Series>, FormatError> {
    let markers = discover_series_markers(source)?;
    if markers.is_empty() {
        return Err(FormatError::PixelDataNotFound {
            marker: "BigEndian",
        });
    }
    debug!(series = markers.len(), "located series markers");

    let mut index = Vec::with_capacity(markers.len());
    for (series, (marker_pos, byte_order)) in markers.into_iter().enumerate() {
        index.push(build_series(source, metadata, series, marker_pos, byte_order)?);
    }
    Ok(index)
}

/// Phase 1: find every `BigEndian` attribute and parse its value.
fn discover_series_markers<S: ByteSource + ?Sized>(
    source: &S,
) -> Result<Vec<(u64, ByteOrder)>, FormatError> {
    let scanner = MarkerScanner::new(ENDIAN_MARKER, ENDIAN_CARRY);
    let positions = scanner.find_all(source, 0)?;

    let mut markers = Vec::with_capacity(positions.len());
    for pos in positions {
        markers.push((pos, read_endian_value(source, pos)?));
    }
    Ok(markers)
}

/// Parse the attribute value just past a `BigEndian` match: skip the `="`
/// delimiter, tolerate whitespace, strip the opening quote, and test the
/// first letter case-insensitively. Anything not starting with `t` means
/// little-endian.
fn read_endian_value<S: ByteSource + ?Sized>(
    source: &S,
    marker_pos: u64,
) -> Result<ByteOrder, FormatError> {
    let value_at = marker_pos + ENDIAN_MARKER.len() as u64;
    let len = ENDIAN_VALUE_PROBE.min(source.size().saturating_sub(value_at) as usize);
    let probe = source.read_exact_at(value_at, len)?;

    let text = String::from_utf8_lossy(probe.get(2..).unwrap_or(&[]));
    let token = text.trim_start().trim_start_matches('"');

    if token.starts_with(['t', 'T']) {
        Ok(ByteOrder::BigEndian)
    } else {
        Ok(ByteOrder::LittleEndian)
    }
}

/// Phases 2-4 for one series.
fn build_series<S: ByteSource + ?Sized>(
    source: &S,
    metadata: &dyn MetadataRetrieve,
    series: usize,
    marker_pos: u64,
    byte_order: ByteOrder,
) -> Result<Series, FormatError> {
    // Bind dimensions and sample type first; the skip heuristic below
    // needs the plane byte size.
    let width = require(metadata.size_x(series), "SizeX", series)?;
    let height = require(metadata.size_y(series), "SizeY", series)?;
    let size_z = require(metadata.size_z(series), "SizeZ", series)?;
    let size_c = require(metadata.size_c(series), "SizeC", series)?;
    let size_t = require(metadata.size_t(series), "SizeT", series)?;
    let pixel_type = PixelType::from_label(require(metadata.pixel_type(series), "PixelType", series)?);
    let dimension_order =
        require(metadata.dimension_order(series), "DimensionOrder", series)?.to_string();

    let scanner = MarkerScanner::with_excludes(BIN_MARKER, FIRST_BIN_CARRY, BIN_EXCLUDES);
    let first = scanner
        .find_first(source, marker_pos)?
        .ok_or(FormatError::PixelDataNotFound { marker: "<Bin" })?;

    let compression = probe_compression(source, first)?;

    let declared = size_z as usize * size_c as usize * size_t as usize;
    let plane_len = width as usize * height as usize * pixel_type.bytes_per_pixel();

    let mut offsets = vec![first];

    // Skipping half the decoded plane size is a conservative estimate of
    // the encoded payload length; it keeps the scan off the payload text
    // without risking an overshoot past small blocks. When it still comes
    // up short, rescan every byte.
    search_for_data(source, &mut offsets, (plane_len / 2) as u64, declared)?;
    if offsets.len() < declared {
        debug!(
            series,
            found = offsets.len(),
            declared,
            "skip-ahead pass came up short, rescanning exhaustively"
        );
        search_for_data(source, &mut offsets, 0, declared)?;
    }
    if offsets.len() < declared {
        warn!(
            series,
            found = offsets.len(),
            declared,
            "fewer pixel blocks than declared planes, reducing plane count"
        );
    }

    debug!(
        series,
        planes = offsets.len(),
        compression = compression.name(),
        byte_order = byte_order.name(),
        "series indexed"
    );

    Ok(Series {
        width,
        height,
        size_z,
        size_c,
        size_t,
        dimension_order,
        pixel_type,
        byte_order,
        compression,
        offsets,
        marker_pos,
    })
}

/// Phase 3: discover subsequent block offsets for one series.
///
/// `offsets` must hold the series' anchor offset; the vector is reset to
/// that anchor before scanning so the exhaustive retry starts clean.
/// Between windows the session skips `safe` bytes; `safe = 0` degrades to
/// an adjacent-window scan of every byte.
fn search_for_data<S: ByteSource + ?Sized>(
    source: &S,
    offsets: &mut Vec<u64>,
    safe: u64,
    target: usize,
) -> Result<(), FormatError> {
    debug_assert!(!offsets.is_empty());
    offsets.truncate(1);

    let scanner = MarkerScanner::with_excludes(BIN_MARKER, SEARCH_BIN_CARRY, BIN_EXCLUDES);
    let size = source.size();
    let mut session = scanner.session(source, offsets[0] + 1);
    let mut last = offsets[0];

    while offsets.len() < target && session.position() + safe < size {
        session.skip(safe);
        let Some(hits) = session.next_window()? else {
            break;
        };
        for hit in hits {
            if offsets.len() >= target {
                break;
            }
            // Offsets must stay strictly increasing.
            if hit > last {
                offsets.push(hit);
                last = hit;
            }
        }
    }
    Ok(())
}

fn require<T>(value: Option<T>, field: &'static str, series: usize) -> Result<T, FormatError> {
    value.ok_or(FormatError::MissingMetadata { field, series })
}

/// Phase 4 probe: look for a `Compression="..."` attribute within the
/// first few hundred bytes of a series' first pixel block.
fn probe_compression<S: ByteSource + ?Sized>(
    source: &S,
    block_offset: u64,
) -> Result<Compression, FormatError> {
    let len = COMPRESSION_PROBE.min(source.size().saturating_sub(block_offset) as usize);
    let probe = source.read_exact_at(block_offset, len)?;
    let text = String::from_utf8_lossy(&probe);

    let Some(at) = text.find(COMPRESSION_ATTR) else {
        return Ok(Compression::None);
    };
    let value_start = at + COMPRESSION_ATTR.len();
    let Some(value_len) = text[value_start..].find('"') else {
        return Ok(Compression::None);
    };

    Ok(Compression::from_label(
        &text[value_start..value_start + value_len],
    ))
}

// =============================================================================
// Tests
// =============================================================================
