//! Per-stream frame decoding

use crate::bitmap::decode_uncompressed;
use crate::error::{DibError, Result};
use crate::raster::Raster;
use crate::rle8::decode_rle8;
use crate::types::{BitmapFormat, Compression};

/// Decodes the frames of one video stream.
///
/// Built once from the stream's format; every call to [`decode`](Self::decode)
/// produces a fresh raster and keeps no state between frames.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    format: BitmapFormat,
}

impl FrameDecoder {
    /// Create a decoder, rejecting formats with no decode path
    pub fn new(format: BitmapFormat) -> Result<Self> {
        if !format.is_supported() {
            return Err(DibError::Unsupported {
                compression: format.compression,
                bit_count: format.bit_count,
            });
        }
        if format.width == 0 || format.height == 0 {
            return Err(DibError::InvalidDimensions {
                width: format.width,
                height: format.height,
            });
        }

        Ok(FrameDecoder { format })
    }

    /// Format this decoder was built for
    pub fn format(&self) -> &BitmapFormat {
        &self.format
    }

    /// Decode one chunk payload into a top-down raster
    pub fn decode(&self, data: &[u8]) -> Result<Raster> {
        match self.format.compression {
            Compression::Rgb => decode_uncompressed(&self.format, data),
            // RLE bitmaps are always coded bottom-up
            Compression::Rle8 => decode_rle8(data, self.format.width, self.format.height),
            compression => Err(DibError::Unsupported {
                compression,
                bit_count: self.format.bit_count,
            }),
        }
    }
}
