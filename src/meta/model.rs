//! Metadata accessor and sink contracts.
//!
//! The index builder treats XML metadata as an external collaborator: it
//! asks a [`MetadataRetrieve`] for per-series dimensions and pixel-type
//! strings, and publishes the finished per-series geometry records to a
//! [`MetadataStore`]. The built-in attribute scraper implements the
//! accessor side; callers with a richer XML model can plug in their own.

use serde::Serialize;

use super::{ByteOrder, Compression, PixelType};

/// Read-side metadata accessor, one entry per series.
///
/// All accessors return `None` when the document does not carry the field;
/// the index builder turns a missing required field into a
/// [`MissingMetadata`](crate::error::FormatError::MissingMetadata) error.
pub trait MetadataRetrieve: Send + Sync {
    /// Number of series the metadata describes.
    fn series_count(&self) -> usize;

    /// Plane width in pixels.
    fn size_x(&self, series: usize) -> Option<u32>;

    /// Plane height in pixels.
    fn size_y(&self, series: usize) -> Option<u32>;

    /// Number of focal planes.
    fn size_z(&self, series: usize) -> Option<u32>;

    /// Number of channels.
    fn size_c(&self, series: usize) -> Option<u32>;

    /// Number of timepoints.
    fn size_t(&self, series: usize) -> Option<u32>;

    /// Pixel-type label, e.g. `"uint16"`.
    fn pixel_type(&self, series: usize) -> Option<&str>;

    /// Dimension-order label, e.g. `"XYZCT"`.
    fn dimension_order(&self, series: usize) -> Option<&str>;
}

/// Write-side metadata sink: receives one geometry record per series once
/// the index build has bound offsets, endianness, and compression.
pub trait MetadataStore {
    /// Record one series.
    fn store_series(&mut self, geometry: &SeriesGeometry);
}

/// Fully bound per-series geometry, as published to a [`MetadataStore`]
/// and reported by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesGeometry {
    /// Series index within the file
    pub series: usize,
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
    /// Bytes per sample
    pub bytes_per_pixel: usize,
    /// Sample byte order
    pub byte_order: ByteOrder,
    /// Payload compression scheme
    pub compression: Compression,
    /// Plane count implied by Z*C*T
    pub declared_planes: usize,
    /// Planes actually located in the file
    pub plane_count: usize,
}

/// Simple [`MetadataStore`] that collects records in series order.
#[derive(Debug, Default)]
pub struct SeriesTable {
    rows: Vec<SeriesGeometry>,
}

impl SeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, series: usize) -> Option<&SeriesGeometry> {
        self.rows.get(series)
    }

    pub fn rows(&self) -> &[SeriesGeometry] {
        &self.rows
    }
}

impl MetadataStore for SeriesTable {
    fn store_series(&mut self, geometry: &SeriesGeometry) {
        self.rows.push(geometry.clone());
    }
}
