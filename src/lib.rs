//! # omepix
//!
//! A reader for OME-XML pixel containers: XML documents carrying their
//! pixel data inline as base64 text, optionally zlib- or bzip2-compressed.
//!
//! The pixel blocks sit at byte offsets the XML structure does not declare,
//! so the reader indexes a file by scanning it in fixed-size windows and
//! never materializes the whole document. Multi-gigabyte containers open
//! with a bounded memory footprint.
//!
//! ## Features
//!
//! - **Windowed scanning**: Locates series markers and pixel blocks with a
//!   sliding window and a carry across window boundaries
//! - **Multi-series files**: Each `<Image>` element becomes an addressable
//!   series with its own dimensions, byte order, and compression
//! - **Plane decoding**: base64 payloads, raw or zlib/bzip2-compressed,
//!   decoded to exact-size planes
//! - **Region reads**: Rectangular crops out of any plane without decoding
//!   neighbors twice, backed by a byte-budgeted plane cache
//! - **Rendering**: Autoscaled grayscale PNG output for any sample type
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`io`] - byte sources: files and in-memory buffers
//! - [`scan`] - the windowed marker scanner
//! - [`meta`] - metadata accessors and pixel descriptors
//! - [`mod@format`] - container detection, series indexing, plane decoding
//! - [`cache`] - the decoded-plane LRU cache
//! - [`render`] - grayscale PNG rendering
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use omepix::{FileSource, OmeXmlReader, Region};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = FileSource::open("sample.ome")?;
//!     let reader = OmeXmlReader::open(source)?;
//!
//!     for (i, series) in reader.all_series().iter().enumerate() {
//!         println!(
//!             "series {}: {}x{}, {} planes",
//!             i,
//!             series.width,
//!             series.height,
//!             series.plane_count()
//!         );
//!     }
//!
//!     // Decode the first plane, then crop a window out of it.
//!     let plane = reader.read_plane(0, 0)?;
//!     println!("plane 0: {} bytes", plane.len());
//!
//!     let region = Region::new(0, 0, 64, 64);
//!     let mut window = vec![0u8; region.byte_len(reader.all_series()[0].bytes_per_pixel())];
//!     reader.read_region(0, 0, region, &mut window)?;
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod meta;
pub mod reader;
pub mod render;
pub mod scan;

// Re-export commonly used types
pub use cache::{PlaneCache, PlaneKey, DEFAULT_PLANE_CACHE_CAPACITY};
pub use config::{CheckConfig, Cli, Command, ExtractConfig, InfoConfig, OutputFormat};
pub use error::{FormatError, IoError, ReadError, RenderError};
pub use format::{
    build_index, copy_region, decode_plane, detect_format, is_ome_xml, Region, Series,
};
pub use io::{ByteSource, FileSource, MemorySource};
pub use meta::{
    ByteOrder, Compression, MetadataParser, MetadataRetrieve, MetadataStore, OmeSupport,
    OmeXmlMetadata, OmeXmlParser, PixelType, SeriesGeometry, SeriesTable,
};
pub use reader::OmeXmlReader;
pub use render::PngRenderer;
pub use scan::{MarkerScanner, ScanSession, SCAN_WINDOW};
