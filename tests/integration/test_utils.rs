//! Test utilities for integration tests.
//!
//! This module provides a request-tracking byte source and a builder for
//! synthetic OME-XML containers with various series configurations.

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use omepix::error::IoError;
use omepix::io::{ByteSource, MemorySource};

// =============================================================================
// Tracking Byte Source
// =============================================================================

/// A byte source that records every range request.
///
/// Tracking state is shared across clones, so a test can keep one handle
/// for assertions and hand another to the reader.
#[derive(Clone)]
pub struct TrackingSource {
    inner: MemorySource,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(u64, usize)>>>,
}

impl TrackingSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            inner: MemorySource::with_identifier(data, "tracking"),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(u64, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

impl ByteSource for TrackingSource {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((offset, len));
        self.inner.read_exact_at(offset, len)
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn identifier(&self) -> &str {
        self.inner.identifier()
    }
}

// =============================================================================
// OME-XML Container Builder
// =============================================================================

/// Payload compression for a builder series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    None,
    Zlib,
    Bzip2,
}

impl Codec {
    fn label(self) -> Option<&'static str> {
        match self {
            Codec::None => None,
            Codec::Zlib => Some("zlib"),
            Codec::Bzip2 => Some("bzip2"),
        }
    }

    fn encode(self, plane: &[u8]) -> Vec<u8> {
        match self {
            Codec::None => plane.to_vec(),
            Codec::Zlib => {
                let mut encoder =
                    flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(plane).unwrap();
                encoder.finish().unwrap()
            }
            Codec::Bzip2 => {
                // The reader strips the payload's first two bytes and restores
                // the stream magic, so a standard stream embeds as-is.
                let mut encoder =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
                encoder.write_all(plane).unwrap();
                encoder.finish().unwrap()
            }
        }
    }
}

/// One series of a synthetic container.
pub struct SeriesSpec {
    width: u32,
    height: u32,
    size_z: u32,
    size_c: u32,
    size_t: u32,
    pixel_type: &'static str,
    dimension_order: &'static str,
    big_endian: bool,
    codec: Codec,
    planes: Vec<Vec<u8>>,
    wrap: usize,
    external_refs: usize,
}

impl SeriesSpec {
    /// A series whose declared Z covers `planes.len()`, C = T = 1.
    pub fn new(width: u32, height: u32, pixel_type: &'static str, planes: Vec<Vec<u8>>) -> Self {
        Self {
            width,
            height,
            size_z: planes.len() as u32,
            size_c: 1,
            size_t: 1,
            pixel_type,
            dimension_order: "XYZCT",
            big_endian: false,
            codec: Codec::None,
            planes,
            wrap: 0,
            external_refs: 0,
        }
    }

    pub fn big_endian(mut self, big_endian: bool) -> Self {
        self.big_endian = big_endian;
        self
    }

    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Override the declared Z dimension, e.g. to declare more planes
    /// than the series actually carries.
    pub fn declared_z(mut self, size_z: u32) -> Self {
        self.size_z = size_z;
        self
    }

    /// Wrap base64 payload text at this many characters per line.
    pub fn wrap(mut self, chars: usize) -> Self {
        self.wrap = chars;
        self
    }

    /// Emit this many `<Bin:External>` references before the pixel blocks.
    pub fn external_refs(mut self, count: usize) -> Self {
        self.external_refs = count;
        self
    }

    fn write_to(&self, doc: &mut String, series: usize) {
        doc.push_str(&format!("<Image ID=\"Image:{series}\" Name=\"series {series}\">"));
        doc.push_str(&format!(
            "<Pixels ID=\"Pixels:{series}\" BigEndian=\"{}\" DimensionOrder=\"{}\" \
             PixelType=\"{}\" SizeX=\"{}\" SizeY=\"{}\" SizeZ=\"{}\" SizeC=\"{}\" SizeT=\"{}\">",
            self.big_endian,
            self.dimension_order,
            self.pixel_type,
            self.width,
            self.height,
            self.size_z,
            self.size_c,
            self.size_t
        ));

        for i in 0..self.external_refs {
            doc.push_str(&format!("<Bin:External href=\"external-{i}.raw\"/>"));
        }

        for (i, plane) in self.planes.iter().enumerate() {
            let mut text = STANDARD.encode(self.codec.encode(plane));
            if self.wrap > 0 {
                text = wrap_lines(&text, self.wrap);
            }

            let compression = match self.codec.label() {
                Some(label) if i == 0 => format!(" Compression=\"{label}\""),
                _ => String::new(),
            };
            doc.push_str(&format!(
                "<BinData{compression} Length=\"{}\">{text}</BinData>",
                text.len()
            ));
        }

        doc.push_str("</Pixels></Image>");
    }
}

/// Builder for synthetic OME-XML containers.
pub struct OmeXmlBuilder {
    series: Vec<SeriesSpec>,
}

impl OmeXmlBuilder {
    pub fn new() -> Self {
        Self { series: Vec::new() }
    }

    pub fn series(mut self, series: SeriesSpec) -> Self {
        self.series.push(series);
        self
    }

    /// Build the document bytes.
    pub fn build(self) -> Vec<u8> {
        let mut doc = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <OME xmlns=\"http://www.openmicroscopy.org/Schemas/OME/2016-06\">",
        );

        for (i, series) in self.series.iter().enumerate() {
            series.write_to(&mut doc, i);
        }
        doc.push_str("</OME>");

        // Base64 text can in principle spell out the series marker; the
        // builder's fixtures must not, or the index would see phantom series.
        let markers = doc.matches("BigEndian").count();
        assert_eq!(
            markers,
            self.series.len(),
            "fixture base64 accidentally contains a series marker"
        );

        doc.into_bytes()
    }
}

impl Default for OmeXmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap_lines(text: &str, width: usize) -> String {
    let mut wrapped = String::with_capacity(text.len() + text.len() / width + 1);
    for (i, c) in text.chars().enumerate() {
        if i > 0 && i % width == 0 {
            wrapped.push('\n');
        }
        wrapped.push(c);
    }
    wrapped
}

// =============================================================================
// Plane Data Helpers
// =============================================================================

/// Deterministic plane bytes: a gradient offset by `seed`.
pub fn gradient_plane(len: usize, seed: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 7 + seed) % 251) as u8).collect()
}

/// Decode a PNG and return its dimensions and 8-bit grayscale pixels.
pub fn decode_png_gray(png: &[u8]) -> (u32, u32, Vec<u8>) {
    let reader = image::ImageReader::with_format(Cursor::new(png), image::ImageFormat::Png);
    let img = reader.decode().unwrap().to_luma8();
    let (w, h) = img.dimensions();
    (w, h, img.into_raw())
}
