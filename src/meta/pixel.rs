//! Per-series pixel descriptors: sample type, byte order, compression tag.

use serde::Serialize;

use crate::io::{read_f32_be, read_f32_le, read_u16_be, read_u16_le, read_u32_be, read_u32_le};

// =============================================================================
// PixelType
// =============================================================================

/// Sample type of a series, derived from the document's pixel-type string.
///
/// The mapping follows the container's loose convention rather than a strict
/// token table: a label ending in `16` is a 2-byte integer, one ending in
/// `32` is a 4-byte integer, the exact label `float` is a 4-byte IEEE float,
/// and anything else is treated as a 1-byte integer. Signedness comes from
/// the leading character: labels starting with `u` are unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    /// Signed 8-bit integer
    Int8,
    /// Unsigned 8-bit integer
    UInt8,
    /// Signed 16-bit integer
    Int16,
    /// Unsigned 16-bit integer
    UInt16,
    /// Signed 32-bit integer
    Int32,
    /// Unsigned 32-bit integer
    UInt32,
    /// 32-bit IEEE float
    Float,
}

impl PixelType {
    /// Map a pixel-type label (e.g. `"uint16"`) to a descriptor.
    ///
    /// Unrecognized labels fall back to a 1-byte integer, matching the
    /// container convention. This function does not fail.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_ascii_lowercase();
        let signed = !lower.starts_with('u');

        if lower.ends_with("16") {
            if signed {
                PixelType::Int16
            } else {
                PixelType::UInt16
            }
        } else if lower.ends_with("32") {
            if signed {
                PixelType::Int32
            } else {
                PixelType::UInt32
            }
        } else if lower == "float" {
            PixelType::Float
        } else if signed {
            PixelType::Int8
        } else {
            PixelType::UInt8
        }
    }

    /// Bytes occupied by one sample.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelType::Int8 | PixelType::UInt8 => 1,
            PixelType::Int16 | PixelType::UInt16 => 2,
            PixelType::Int32 | PixelType::UInt32 | PixelType::Float => 4,
        }
    }

    /// Whether samples are signed.
    pub fn is_signed(self) -> bool {
        !matches!(self, PixelType::UInt8 | PixelType::UInt16 | PixelType::UInt32)
    }

    /// Whether samples are IEEE floats.
    pub fn is_float(self) -> bool {
        matches!(self, PixelType::Float)
    }

    /// Canonical lowercase label.
    pub fn name(self) -> &'static str {
        match self {
            PixelType::Int8 => "int8",
            PixelType::UInt8 => "uint8",
            PixelType::Int16 => "int16",
            PixelType::UInt16 => "uint16",
            PixelType::Int32 => "int32",
            PixelType::UInt32 => "uint32",
            PixelType::Float => "float",
        }
    }
}

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order of multi-byte samples in a series.
///
/// Declared per series by the document's `BigEndian` attribute; all samples
/// wider than one byte must be read respecting this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ByteOrder {
    /// Little-endian
    LittleEndian,
    /// Big-endian
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => read_u32_le(bytes),
            ByteOrder::BigEndian => read_u32_be(bytes),
        }
    }

    /// Read an f32 from a byte slice using this byte order.
    #[inline]
    pub fn read_f32(self, bytes: &[u8]) -> f32 {
        match self {
            ByteOrder::LittleEndian => read_f32_le(bytes),
            ByteOrder::BigEndian => read_f32_be(bytes),
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "little-endian",
            ByteOrder::BigEndian => "big-endian",
        }
    }
}

// =============================================================================
// Compression
// =============================================================================

/// Compression scheme applied to a series' pixel payloads before base64
/// encoding. Discovered from the `Compression="..."` attribute near the
/// series' first pixel block; absence means no compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Payload is the raw plane bytes
    None,
    /// Payload is a zlib stream
    Zlib,
    /// Payload is a bzip2 stream
    Bzip2,
}

impl Compression {
    /// Map a `Compression` attribute value to a scheme. Unrecognized values
    /// are treated as uncompressed.
    pub fn from_label(label: &str) -> Self {
        match label {
            "zlib" => Compression::Zlib,
            "bzip2" => Compression::Bzip2,
            _ => Compression::None,
        }
    }

    /// Canonical lowercase label.
    pub fn name(self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Zlib => "zlib",
            Compression::Bzip2 => "bzip2",
        }
    }
}
