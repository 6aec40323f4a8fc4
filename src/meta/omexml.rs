//! Built-in OME-XML metadata accessor.
//!
//! A full XML object model is deliberately out of scope here; the index
//! builder only needs a handful of attributes from each `<Pixels>` opening
//! tag. This scraper locates those tags with the same streaming scanner the
//! index builder uses, reads a short probe at each, and pulls the attribute
//! values out of the tag text. Attributes must be in the plain
//! `Name="value"` form, which is what the container format's writers emit.

use crate::error::FormatError;
use crate::io::ByteSource;
use crate::scan::MarkerScanner;

use super::MetadataRetrieve;

/// Opening tag of the per-series pixel description element.
const PIXELS_MARKER: &[u8] = b"<Pixels";

/// Probe length for one `<Pixels ...>` opening tag's attribute text.
const PIXELS_TAG_PROBE: usize = 1024;

/// Metadata accessor scraped from the document's `<Pixels>` elements,
/// one per series, in document order.
#[derive(Debug, Clone, Default)]
pub struct OmeXmlMetadata {
    series: Vec<PixelsAttrs>,
}

#[derive(Debug, Clone, Default)]
struct PixelsAttrs {
    size_x: Option<u32>,
    size_y: Option<u32>,
    size_z: Option<u32>,
    size_c: Option<u32>,
    size_t: Option<u32>,
    pixel_type: Option<String>,
    dimension_order: Option<String>,
}

impl OmeXmlMetadata {
    /// Scrape every `<Pixels>` opening tag in the document.
    ///
    /// Bounded-memory: one scan pass for tag offsets, then one short probe
    /// per tag. Payload text cannot produce false tag matches because the
    /// base64 alphabet does not contain `<`.
    pub fn scan<S: ByteSource + ?Sized>(source: &S) -> Result<Self, FormatError> {
        let scanner = MarkerScanner::new(PIXELS_MARKER, PIXELS_MARKER.len() - 1);
        let tags = scanner.find_all(source, 0)?;

        let mut series = Vec::with_capacity(tags.len());
        for offset in tags {
            let len = PIXELS_TAG_PROBE.min((source.size() - offset) as usize);
            let probe = source.read_exact_at(offset, len)?;
            series.push(PixelsAttrs::from_tag(&probe));
        }

        Ok(Self { series })
    }
}

impl PixelsAttrs {
    /// Parse attributes from a probe that starts at the tag's `<`.
    fn from_tag(probe: &[u8]) -> Self {
        // Only the opening tag itself is attribute text.
        let end = probe
            .iter()
            .position(|&b| b == b'>')
            .unwrap_or(probe.len());
        let text = String::from_utf8_lossy(&probe[..end]);

        // Schema revisions renamed the pixel-type attribute from
        // `PixelType` to `Type`; accept either.
        let pixel_type = attr_value(&text, "PixelType")
            .or_else(|| attr_value(&text, "Type"))
            .map(str::to_string);

        Self {
            size_x: attr_u32(&text, "SizeX"),
            size_y: attr_u32(&text, "SizeY"),
            size_z: attr_u32(&text, "SizeZ"),
            size_c: attr_u32(&text, "SizeC"),
            size_t: attr_u32(&text, "SizeT"),
            pixel_type,
            dimension_order: attr_value(&text, "DimensionOrder").map(str::to_string),
        }
    }
}

impl MetadataRetrieve for OmeXmlMetadata {
    fn series_count(&self) -> usize {
        self.series.len()
    }

    fn size_x(&self, series: usize) -> Option<u32> {
        self.series.get(series)?.size_x
    }

    fn size_y(&self, series: usize) -> Option<u32> {
        self.series.get(series)?.size_y
    }

    fn size_z(&self, series: usize) -> Option<u32> {
        self.series.get(series)?.size_z
    }

    fn size_c(&self, series: usize) -> Option<u32> {
        self.series.get(series)?.size_c
    }

    fn size_t(&self, series: usize) -> Option<u32> {
        self.series.get(series)?.size_t
    }

    fn pixel_type(&self, series: usize) -> Option<&str> {
        self.series.get(series)?.pixel_type.as_deref()
    }

    fn dimension_order(&self, series: usize) -> Option<&str> {
        self.series.get(series)?.dimension_order.as_deref()
    }
}

/// Find `name="value"` in tag text and return the value.
///
/// The name must sit on an attribute boundary (preceded by whitespace), so
/// `Type` does not match inside `PixelType`.
fn attr_value<'t>(text: &'t str, name: &str) -> Option<&'t str> {
    let needle = format!("{name}=\"");
    let mut from = 0;

    while let Some(found) = text[from..].find(&needle) {
        let at = from + found;
        from = at + 1;

        let boundary = text[..at]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_whitespace());
        if !boundary {
            continue;
        }

        let value_start = at + needle.len();
        let value_end = text[value_start..].find('"')? + value_start;
        return Some(&text[value_start..value_end]);
    }

    None
}

fn attr_u32(text: &str, name: &str) -> Option<u32> {
    attr_value(text, name)?.parse().ok()
}
