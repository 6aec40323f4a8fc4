//! Grayscale PNG rendering of decoded pixel data.
//!
//! Scientific planes carry samples far outside the displayable 0-255
//! range, so rendering autoscales: the sample minimum maps to black, the
//! maximum to white, everything between linearly. The output is always
//! 8-bit grayscale PNG regardless of the source sample type.

use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::RenderError;
use crate::meta::{ByteOrder, PixelType};

// =============================================================================
// PNG Renderer
// =============================================================================

/// Renders raw sample buffers to autoscaled grayscale PNG.
///
/// Works on any rectangle of samples, so both whole planes and extracted
/// regions render through the same path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngRenderer {}

impl PngRenderer {
    pub fn new() -> Self {
        Self {}
    }

    /// Render `width * height` samples to a grayscale PNG.
    ///
    /// `data` holds the samples in the file's byte order, rows contiguous,
    /// exactly as [`read_plane`](crate::OmeXmlReader::read_plane) and
    /// [`read_region`](crate::OmeXmlReader::read_region) produce them.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not match the stated geometry or if
    /// PNG encoding fails.
    pub fn render(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        pixel_type: PixelType,
        byte_order: ByteOrder,
    ) -> Result<Bytes, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidInput {
                message: format!("image dimensions {width}x{height} are empty"),
            });
        }

        let count = width as usize * height as usize;
        let expected = count * pixel_type.bytes_per_pixel();
        if data.len() != expected {
            return Err(RenderError::InvalidInput {
                message: format!(
                    "buffer holds {} bytes, {width}x{height} {} needs {expected}",
                    data.len(),
                    pixel_type.name()
                ),
            });
        }

        let pixels = autoscale(data, count, pixel_type, byte_order);

        let mut output = Vec::new();
        let encoder = PngEncoder::new(&mut output);
        encoder
            .write_image(&pixels, width, height, ExtendedColorType::L8)
            .map_err(|e| RenderError::Encode {
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output))
    }
}

/// Map samples linearly onto 0-255, minimum to 0 and maximum to 255.
///
/// NaN samples are ignored when finding the range and render as black.
/// A constant plane has no range and renders all black.
fn autoscale(data: &[u8], count: usize, pixel_type: PixelType, byte_order: ByteOrder) -> Vec<u8> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for i in 0..count {
        let v = sample_at(data, i, pixel_type, byte_order);
        if v.is_nan() {
            continue;
        }
        min = min.min(v);
        max = max.max(v);
    }

    // No finite samples leaves min above max; a constant plane makes them
    // equal. Either way there is no range to stretch.
    if max <= min {
        return vec![0u8; count];
    }

    let scale = 255.0 / (max - min);
    (0..count)
        .map(|i| {
            let v = sample_at(data, i, pixel_type, byte_order);
            if v.is_nan() {
                0
            } else {
                // Float-to-int casts saturate, so infinities land on 0/255.
                ((v - min) * scale) as u8
            }
        })
        .collect()
}

/// Decode the `i`-th sample as f64.
#[inline]
fn sample_at(data: &[u8], i: usize, pixel_type: PixelType, byte_order: ByteOrder) -> f64 {
    let at = i * pixel_type.bytes_per_pixel();
    match pixel_type {
        PixelType::Int8 => data[at] as i8 as f64,
        PixelType::UInt8 => data[at] as f64,
        PixelType::Int16 => byte_order.read_u16(&data[at..]) as i16 as f64,
        PixelType::UInt16 => byte_order.read_u16(&data[at..]) as f64,
        PixelType::Int32 => byte_order.read_u32(&data[at..]) as i32 as f64,
        PixelType::UInt32 => byte_order.read_u32(&data[at..]) as f64,
        PixelType::Float => byte_order.read_f32(&data[at..]) as f64,
    }
}

// =============================================================================
// Tests
// =============================================================================
