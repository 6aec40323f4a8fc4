//! Plane decoding: from a pixel block's byte span to raw plane bytes.
//!
//! A block span starts at the element's `<` and runs to the next block's
//! offset (or end of file). The inline payload is the text between the
//! opening tag's closing `>` and the next `<`: base64, possibly wrapped
//! with whitespace, holding either raw plane bytes or a zlib/bzip2 stream.

use std::io::Read;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, Engine as _, GeneralPurpose, GeneralPurposeConfig};
use bzip2::read::BzDecoder;
use flate2::read::ZlibDecoder;

use crate::error::ReadError;
use crate::meta::Compression;

/// Standard-alphabet base64, tolerant of both padded and unpadded payloads.
const PAYLOAD_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode one plane from its block span.
///
/// `span_offset` is the span's absolute file position, used in error
/// reports. The result is exactly `plane_len` bytes; a payload that
/// decodes short, long, or not at all is a typed error, never a partial
/// buffer.
pub fn decode_plane(
    span: &[u8],
    span_offset: u64,
    compression: Compression,
    plane_len: usize,
) -> Result<Vec<u8>, ReadError> {
    let payload = isolate_payload(span).ok_or(ReadError::MalformedBlock {
        offset: span_offset,
    })?;

    // Writers are free to wrap the base64 text; strip whitespace before
    // decoding.
    let compact: Vec<u8> = payload
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    let decoded = PAYLOAD_BASE64.decode(&compact).map_err(|e| ReadError::Base64 {
        offset: span_offset,
        message: e.to_string(),
    })?;

    match compression {
        Compression::None => {
            if decoded.len() != plane_len {
                return Err(ReadError::SizeMismatch {
                    expected: plane_len,
                    actual: decoded.len(),
                });
            }
            Ok(decoded)
        }
        Compression::Zlib => inflate_exact(ZlibDecoder::new(&decoded[..]), plane_len, "zlib"),
        Compression::Bzip2 => inflate_bzip2(&decoded, plane_len),
    }
}

/// Select the inline payload: bytes after the opening tag's `>` and before
/// the following `<`. A block whose text runs to the end of the span keeps
/// the remainder.
fn isolate_payload(span: &[u8]) -> Option<&[u8]> {
    let open = span.iter().position(|&b| b == b'>')?;
    let body = &span[open + 1..];
    match body.iter().position(|&b| b == b'<') {
        Some(close) => Some(&body[..close]),
        None => Some(body),
    }
}

/// Decompress a bzip2 payload.
///
/// The embedding tool writes two leading bytes that are not part of the
/// stream proper; what follows is a bzip2 stream without its magic. Drop
/// the prefix and restore the magic for the decoder.
fn inflate_bzip2(payload: &[u8], plane_len: usize) -> Result<Vec<u8>, ReadError> {
    let Some(stream) = payload.get(2..) else {
        return Err(ReadError::Decompression {
            message: "bzip2 payload shorter than its 2-byte prefix".to_string(),
        });
    };

    let mut full = Vec::with_capacity(stream.len() + 2);
    full.extend_from_slice(b"BZ");
    full.extend_from_slice(stream);

    inflate_exact(BzDecoder::new(&full[..]), plane_len, "bzip2")
}

/// Inflate into a buffer of exactly `plane_len` bytes. A stream that ends
/// early or keeps going past the plane boundary is an error.
fn inflate_exact<R: Read>(
    mut decoder: R,
    plane_len: usize,
    scheme: &str,
) -> Result<Vec<u8>, ReadError> {
    let mut plane = vec![0u8; plane_len];
    decoder
        .read_exact(&mut plane)
        .map_err(|e| ReadError::Decompression {
            message: format!("{scheme}: {e}"),
        })?;

    let mut probe = [0u8; 1];
    match decoder.read(&mut probe) {
        Ok(0) => Ok(plane),
        Ok(_) => Err(ReadError::Decompression {
            message: format!("{scheme} stream longer than the declared plane"),
        }),
        Err(e) => Err(ReadError::Decompression {
            message: format!("{scheme}: {e}"),
        }),
    }
}
