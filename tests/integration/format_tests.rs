//! Format-specific integration tests.
//!
//! Tests verify:
//! - Detection accepts OME-XML and rejects foreign documents
//! - The index locates pixel blocks across series, window boundaries,
//!   and reference elements that are not inline blocks
//! - Planes decode correctly for every payload codec and byte order
//! - Documents that declare more planes than they carry stay readable

use omepix::error::{FormatError, ReadError};
use omepix::format::detect::HEADER_PROBE_LEN;
use omepix::io::MemorySource;
use omepix::meta::{ByteOrder, Compression, PixelType};
use omepix::scan::SCAN_WINDOW;
use omepix::OmeXmlReader;

use super::test_utils::{gradient_plane, Codec, OmeXmlBuilder, SeriesSpec};

/// Byte offsets of every inline pixel block in a document.
fn block_offsets(doc: &[u8]) -> Vec<u64> {
    let text = std::str::from_utf8(doc).unwrap();
    text.match_indices("<BinData").map(|(i, _)| i as u64).collect()
}

// =============================================================================
// Detection Tests
// =============================================================================

#[test]
fn test_open_rejects_foreign_xml_document() {
    let doc = b"<?xml version=\"1.0\"?><svg xmlns=\"http://www.w3.org/2000/svg\"/>".to_vec();

    let err = OmeXmlReader::open(MemorySource::new(doc)).unwrap_err();
    assert!(matches!(err, FormatError::NotOmeXml { .. }));
}

#[test]
fn test_open_rejects_root_element_past_probe() {
    // The root marker must sit inside the probed header; a document that
    // buries it further in is not recognized.
    let mut doc = b"<?xml version=\"1.0\"?>".to_vec();
    doc.extend(std::iter::repeat(b' ').take(HEADER_PROBE_LEN));
    doc.extend_from_slice(b"<OME></OME>");

    let err = OmeXmlReader::open(MemorySource::new(doc)).unwrap_err();
    assert!(matches!(err, FormatError::NotOmeXml { .. }));
}

#[test]
fn test_open_rejects_series_without_blocks() {
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(2, 2, "uint8", vec![]))
        .build();

    let err = OmeXmlReader::open(MemorySource::new(doc)).unwrap_err();
    assert!(matches!(err, FormatError::PixelDataNotFound { .. }));
}

// =============================================================================
// Index Tests
// =============================================================================

#[test]
fn test_single_series_offsets_match_document() {
    let planes: Vec<Vec<u8>> = (0..3).map(|seed| gradient_plane(64, seed)).collect();
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(8, 8, "uint8", planes.clone()))
        .build();

    let reader = OmeXmlReader::open(MemorySource::new(doc.clone())).unwrap();
    assert_eq!(reader.series_count(), 1);

    let series = reader.series(0).unwrap();
    assert_eq!(series.offsets(), block_offsets(&doc).as_slice());
    assert_eq!(series.plane_count(), 3);
    assert_eq!(series.declared_planes(), 3);

    for (plane, expected) in planes.iter().enumerate() {
        assert_eq!(reader.read_plane(0, plane).unwrap().as_ref(), &expected[..]);
    }
}

#[test]
fn test_multi_series_mixed_endianness() {
    let s0_planes = vec![gradient_plane(16, 10), gradient_plane(16, 11)];
    let s1_planes = vec![gradient_plane(16, 20), gradient_plane(16, 21)];
    let s2_planes = vec![gradient_plane(16, 30)];

    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(4, 4, "uint8", s0_planes.clone()))
        .series(SeriesSpec::new(4, 2, "uint16", s1_planes.clone()).big_endian(true))
        .series(SeriesSpec::new(2, 2, "float", s2_planes.clone()))
        .build();

    let reader = OmeXmlReader::open(MemorySource::new(doc.clone())).unwrap();
    assert_eq!(reader.series_count(), 3);

    let by_series: [(&[Vec<u8>], ByteOrder, PixelType, usize); 3] = [
        (&s0_planes, ByteOrder::LittleEndian, PixelType::UInt8, 1),
        (&s1_planes, ByteOrder::BigEndian, PixelType::UInt16, 2),
        (&s2_planes, ByteOrder::LittleEndian, PixelType::Float, 4),
    ];
    for (i, (planes, order, pixel_type, bpp)) in by_series.iter().enumerate() {
        let series = reader.series(i).unwrap();
        assert_eq!(series.byte_order, *order, "series {i}");
        assert_eq!(series.pixel_type, *pixel_type, "series {i}");
        assert_eq!(series.bytes_per_pixel(), *bpp, "series {i}");

        for (plane, expected) in planes.iter().enumerate() {
            assert_eq!(reader.read_plane(i, plane).unwrap().as_ref(), &expected[..]);
        }
    }

    // Between them the three series claim every block in the file, in order.
    let all: Vec<u64> = reader
        .all_series()
        .iter()
        .flat_map(|s| s.offsets().iter().copied())
        .collect();
    assert_eq!(all, block_offsets(&doc));
}

#[test]
fn test_large_planes_span_many_scan_windows() {
    let planes: Vec<Vec<u8>> = (0..3).map(|seed| gradient_plane(10_000, seed)).collect();
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(100, 100, "uint8", planes.clone()))
        .build();
    assert!(doc.len() > 4 * SCAN_WINDOW, "fixture must span several windows");

    let reader = OmeXmlReader::open(MemorySource::new(doc.clone())).unwrap();
    let series = reader.series(0).unwrap();
    assert_eq!(series.offsets(), block_offsets(&doc).as_slice());

    for (plane, expected) in planes.iter().enumerate() {
        assert_eq!(reader.read_plane(0, plane).unwrap().as_ref(), &expected[..]);
    }
}

#[test]
fn test_declared_planes_exceed_blocks() {
    // Five declared planes, four blocks in the file: the series opens with
    // the reduced count and reads past it are typed errors.
    let planes: Vec<Vec<u8>> = (0..4).map(|seed| gradient_plane(64, seed)).collect();
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(8, 8, "uint8", planes.clone()).declared_z(5))
        .build();

    let reader = OmeXmlReader::open(MemorySource::new(doc)).unwrap();
    let series = reader.series(0).unwrap();
    assert_eq!(series.declared_planes(), 5);
    assert_eq!(series.plane_count(), 4);

    assert_eq!(reader.read_plane(0, 3).unwrap().as_ref(), &planes[3][..]);
    assert!(matches!(
        reader.read_plane(0, 4),
        Err(ReadError::InvalidPlane {
            series: 0,
            plane: 4,
            count: 4
        })
    ));
}

#[test]
fn test_reference_elements_are_not_indexed() {
    let planes = vec![gradient_plane(64, 1), gradient_plane(64, 2)];
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(8, 8, "uint8", planes.clone()).external_refs(2))
        .build();

    // Drop another reference between the two inline blocks.
    let mut doc = String::from_utf8(doc).unwrap();
    let after_first = doc.find("</BinData>").unwrap() + "</BinData>".len();
    doc.insert_str(after_first, "<Bin:BinaryFile FileName=\"elsewhere.raw\"/>");
    let doc = doc.into_bytes();

    let reader = OmeXmlReader::open(MemorySource::new(doc.clone())).unwrap();
    let series = reader.series(0).unwrap();
    assert_eq!(series.offsets(), block_offsets(&doc).as_slice());

    for (plane, expected) in planes.iter().enumerate() {
        assert_eq!(reader.read_plane(0, plane).unwrap().as_ref(), &expected[..]);
    }
}

// =============================================================================
// Payload Codec Tests
// =============================================================================

#[test]
fn test_zlib_series_decodes() {
    let planes = vec![gradient_plane(256, 0), gradient_plane(256, 1)];
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(16, 16, "uint8", planes.clone()).codec(Codec::Zlib))
        .build();

    let reader = OmeXmlReader::open(MemorySource::new(doc)).unwrap();
    assert_eq!(reader.series(0).unwrap().compression, Compression::Zlib);

    // The attribute sits only on the first block; the second decodes with
    // the same series-wide scheme.
    for (plane, expected) in planes.iter().enumerate() {
        assert_eq!(reader.read_plane(0, plane).unwrap().as_ref(), &expected[..]);
    }
}

#[test]
fn test_bzip2_series_decodes() {
    let planes = vec![gradient_plane(256, 0), gradient_plane(256, 1)];
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(16, 16, "uint8", planes.clone()).codec(Codec::Bzip2))
        .build();

    let reader = OmeXmlReader::open(MemorySource::new(doc)).unwrap();
    assert_eq!(reader.series(0).unwrap().compression, Compression::Bzip2);

    for (plane, expected) in planes.iter().enumerate() {
        assert_eq!(reader.read_plane(0, plane).unwrap().as_ref(), &expected[..]);
    }
}

#[test]
fn test_compression_is_per_series() {
    let compressed = vec![gradient_plane(256, 0)];
    let raw = vec![gradient_plane(16, 10)];
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(16, 16, "uint8", compressed.clone()).codec(Codec::Zlib))
        .series(SeriesSpec::new(4, 4, "uint8", raw.clone()))
        .build();

    let reader = OmeXmlReader::open(MemorySource::new(doc)).unwrap();
    assert_eq!(reader.series(0).unwrap().compression, Compression::Zlib);
    assert_eq!(reader.series(1).unwrap().compression, Compression::None);

    assert_eq!(reader.read_plane(0, 0).unwrap().as_ref(), &compressed[0][..]);
    assert_eq!(reader.read_plane(1, 0).unwrap().as_ref(), &raw[0][..]);
}

#[test]
fn test_wrapped_payload_decodes() {
    let plane = gradient_plane(100, 5);
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(10, 10, "uint8", vec![plane.clone()]).wrap(48))
        .build();
    assert!(doc.iter().filter(|&&b| b == b'\n').count() > 1, "payload must be wrapped");

    let reader = OmeXmlReader::open(MemorySource::new(doc)).unwrap();
    assert_eq!(reader.read_plane(0, 0).unwrap().as_ref(), &plane[..]);
}

#[test]
fn test_blocks_smaller_than_skip_distance_are_indexed() {
    // Constant planes compress to a few dozen bytes, so the whole document
    // is smaller than the skip distance derived from the decoded plane
    // size. The index must still locate every block.
    let planes = vec![vec![7u8; 10_000], vec![9u8; 10_000]];
    let doc = OmeXmlBuilder::new()
        .series(SeriesSpec::new(100, 100, "uint8", planes.clone()).codec(Codec::Zlib))
        .build();
    assert!(doc.len() < 5_000, "fixture must be smaller than the skip distance");

    let reader = OmeXmlReader::open(MemorySource::new(doc)).unwrap();
    let series = reader.series(0).unwrap();
    assert_eq!(series.plane_count(), 2);

    for (plane, expected) in planes.iter().enumerate() {
        assert_eq!(reader.read_plane(0, plane).unwrap().as_ref(), &expected[..]);
    }
}
