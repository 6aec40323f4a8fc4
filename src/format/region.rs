//! Rectangular region extraction from a decoded plane.

use crate::error::ReadError;

/// A rectangular pixel region within a plane, in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full plane of the given dimensions.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Bytes the region occupies at the given sample width.
    pub fn byte_len(&self, bytes_per_pixel: usize) -> usize {
        self.width as usize * self.height as usize * bytes_per_pixel
    }
}

/// Copy `region` out of a decoded plane into `dest`, row by row.
///
/// `plane` must hold `plane_width * plane_height * bytes_per_pixel` bytes.
/// Each output row is `region.width * bytes_per_pixel` contiguous bytes;
/// rows are packed with no padding. Out-of-bounds regions and undersized
/// destination buffers are typed errors, checked before any copy.
pub fn copy_region(
    plane: &[u8],
    plane_width: u32,
    plane_height: u32,
    bytes_per_pixel: usize,
    region: Region,
    dest: &mut [u8],
) -> Result<(), ReadError> {
    let fits_x = region.x.checked_add(region.width).is_some_and(|e| e <= plane_width);
    let fits_y = region.y.checked_add(region.height).is_some_and(|e| e <= plane_height);
    if !fits_x || !fits_y {
        return Err(ReadError::RegionOutOfBounds {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            plane_width,
            plane_height,
        });
    }

    let required = region.byte_len(bytes_per_pixel);
    if dest.len() < required {
        return Err(ReadError::BufferTooSmall {
            required,
            actual: dest.len(),
        });
    }

    let src_stride = plane_width as usize * bytes_per_pixel;
    let row_len = region.width as usize * bytes_per_pixel;
    let x_bytes = region.x as usize * bytes_per_pixel;

    for row in 0..region.height as usize {
        let src = (row + region.y as usize) * src_stride + x_bytes;
        let dst = row * row_len;
        dest[dst..dst + row_len].copy_from_slice(&plane[src..src + row_len]);
    }

    Ok(())
}
