//! Decoded frame buffers

use crate::error::{DibError, Result};

/// Largest raster a single frame may allocate (256 MiB)
const MAX_RASTER_BYTES: usize = 256 * 1024 * 1024;

/// A decoded frame: top-down, row-major pixel rows.
///
/// Each row occupies `stride` bytes, the pixel bytes followed by zero
/// padding up to the next 4-byte boundary. Pixel values are copied as
/// stored (palette indices or packed BGR), never colour-converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    bit_depth: u16,
    stride: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Allocate a zero-filled raster
    pub fn new(width: u32, height: u32, bit_depth: u16) -> Result<Self> {
        if width == 0 || height == 0 || bit_depth == 0 {
            return Err(DibError::InvalidDimensions { width, height });
        }

        let row_bytes = (width as usize * bit_depth as usize + 7) / 8;
        let stride = (row_bytes + 3) & !3;
        let size = stride
            .checked_mul(height as usize)
            .filter(|&size| size <= MAX_RASTER_BYTES)
            .ok_or(DibError::InvalidDimensions { width, height })?;

        Ok(Raster {
            width,
            height,
            bit_depth,
            stride,
            data: vec![0; size],
        })
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bits per pixel
    pub fn bit_depth(&self) -> u16 {
        self.bit_depth
    }

    /// Bytes between the starts of consecutive rows
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel bytes in one row, without padding
    pub fn row_bytes(&self) -> usize {
        (self.width as usize * self.bit_depth as usize + 7) / 8
    }

    /// Row `y` (0 = top) without padding
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        Some(&self.data[start..start + self.row_bytes()])
    }

    /// Mutable row `y` (0 = top) without padding
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        let row_bytes = self.row_bytes();
        Some(&mut self.data[start..start + row_bytes])
    }

    /// Iterate rows from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let row_bytes = self.row_bytes();
        self.data
            .chunks_exact(self.stride)
            .map(move |row| &row[..row_bytes])
    }

    /// Byte value of an 8-bit pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if self.bit_depth != 8 || x >= self.width {
            return None;
        }
        self.row(y).map(|row| row[x as usize])
    }

    /// Whole buffer including row padding
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Pixel rows packed without padding
    pub fn to_packed(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.row_bytes() * self.height as usize);
        for row in self.rows() {
            out.extend_from_slice(row);
        }
        out
    }
}
