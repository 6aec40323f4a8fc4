//! Reader facade integration tests.
//!
//! Tests verify:
//! - File-backed open and plane reads, end to end
//! - Metadata publication to a series table
//! - Region reads with multi-byte samples and typed failures
//! - Plane rendering to PNG

use std::io::Write;

use tempfile::NamedTempFile;

use omepix::error::ReadError;
use omepix::io::{FileSource, MemorySource};
use omepix::meta::{ByteOrder, SeriesTable};
use omepix::{OmeXmlReader, PngRenderer, Region};

use super::test_utils::{decode_png_gray, gradient_plane, OmeXmlBuilder, SeriesSpec};

/// A two-series document: 4x4 uint8 and big-endian 4x2 uint16.
fn two_series_doc() -> (Vec<u8>, Vec<Vec<u8>>, Vec<Vec<u8>>) {
    let s0 = vec![gradient_plane(16, 40), gradient_plane(16, 41)];
    let s1 = vec![gradient_plane(16, 50)];
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(4, 4, "uint8", s0.clone()))
        .series(SeriesSpec::new(4, 2, "uint16", s1.clone()).big_endian(true))
        .build();
    (doc, s0, s1)
}

// =============================================================================
// File-Backed Reads
// =============================================================================

#[test]
fn test_file_backed_round_trip() {
    let (doc, s0, s1) = two_series_doc();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&doc).unwrap();
    file.flush().unwrap();

    let source = FileSource::open(file.path()).unwrap();
    let reader = OmeXmlReader::open(source).unwrap();

    assert_eq!(reader.identifier(), file.path().display().to_string());
    assert_eq!(reader.series_count(), 2);

    assert_eq!(reader.read_plane(0, 0).unwrap().as_ref(), &s0[0][..]);
    assert_eq!(reader.read_plane(0, 1).unwrap().as_ref(), &s0[1][..]);
    assert_eq!(reader.read_plane(1, 0).unwrap().as_ref(), &s1[0][..]);
}

// =============================================================================
// Metadata Publication
// =============================================================================

#[test]
fn test_populate_store_reports_every_series() {
    let (doc, _, _) = two_series_doc();
    let reader = OmeXmlReader::open(MemorySource::new(doc)).unwrap();

    let mut table = SeriesTable::new();
    reader.populate_store(&mut table);

    assert_eq!(table.len(), reader.series_count());
    for (i, series) in reader.all_series().iter().enumerate() {
        assert_eq!(table.get(i).unwrap(), &series.geometry(i));
    }
    assert_eq!(table.get(1).unwrap().byte_order, ByteOrder::BigEndian);
    assert_eq!(table.get(1).unwrap().bytes_per_pixel, 2);
}

// =============================================================================
// Region Reads
// =============================================================================

#[test]
fn test_region_read_keeps_sample_bytes_together() {
    // 4x2 plane of u16 samples; sample (x, y) has bytes [y*4+x, 0x80].
    let mut plane = Vec::new();
    for y in 0..2u8 {
        for x in 0..4u8 {
            plane.extend_from_slice(&[y * 4 + x, 0x80]);
        }
    }
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(4, 2, "uint16", vec![plane]))
        .build();
    let reader = OmeXmlReader::open(MemorySource::new(doc)).unwrap();

    let mut dest = vec![0u8; 8];
    reader
        .read_region(0, 0, Region::new(1, 0, 2, 2), &mut dest)
        .unwrap();
    assert_eq!(dest, vec![1, 0x80, 2, 0x80, 5, 0x80, 6, 0x80]);
}

#[test]
fn test_region_errors_are_typed() {
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(4, 4, "uint8", vec![gradient_plane(16, 10)]))
        .build();
    let reader = OmeXmlReader::open(MemorySource::new(doc)).unwrap();

    let mut dest = vec![0u8; 64];
    let err = reader
        .read_region(0, 0, Region::new(2, 0, 4, 2), &mut dest)
        .unwrap_err();
    assert!(matches!(err, ReadError::RegionOutOfBounds { x: 2, width: 4, .. }));

    let mut small = vec![0u8; 3];
    let err = reader
        .read_region(0, 0, Region::new(0, 0, 2, 2), &mut small)
        .unwrap_err();
    assert!(matches!(
        err,
        ReadError::BufferTooSmall {
            required: 4,
            actual: 3
        }
    ));
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_render_plane_to_png() {
    // Samples already cover the full 0..=255 range, so the scaled output
    // equals the input.
    let data: Vec<u8> = (0..16u32).map(|k| (k * 17) as u8).collect();
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(4, 4, "uint8", vec![data.clone()]))
        .build();
    let reader = OmeXmlReader::open(MemorySource::new(doc)).unwrap();

    let series = reader.series(0).unwrap();
    let plane = reader.read_plane(0, 0).unwrap();
    let png = PngRenderer::new()
        .render(&plane, series.width, series.height, series.pixel_type, series.byte_order)
        .unwrap();
    assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);

    let (width, height, pixels) = decode_png_gray(&png);
    assert_eq!((width, height), (4, 4));
    assert_eq!(pixels, data);
}

#[test]
fn test_render_big_endian_u16_plane() {
    let plane: Vec<u8> = [0u16, 256, 512, 768]
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect();
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(2, 2, "uint16", vec![plane]).big_endian(true))
        .build();
    let reader = OmeXmlReader::open(MemorySource::new(doc)).unwrap();

    let series = reader.series(0).unwrap();
    let data = reader.read_plane(0, 0).unwrap();
    let png = PngRenderer::new()
        .render(&data, series.width, series.height, series.pixel_type, series.byte_order)
        .unwrap();

    let (width, height, pixels) = decode_png_gray(&png);
    assert_eq!((width, height), (2, 2));
    // 0..768 scales to 0..255 in exact quarter steps.
    assert_eq!(pixels, vec![0, 85, 170, 255]);
}
