//! Uncompressed (`BI_RGB`) frames

use crate::error::{DibError, Result};
use crate::raster::Raster;
use crate::types::BitmapFormat;

/// Copy the pixel rows of an uncompressed frame into a top-down raster.
///
/// Rows are expected on 4-byte boundaries. Payloads sized for 2-byte or
/// unpadded rows are also accepted, since some writers emit them.
pub fn decode_uncompressed(format: &BitmapFormat, data: &[u8]) -> Result<Raster> {
    let mut raster = Raster::new(format.width, format.height, format.bit_count)?;
    let height = format.height as usize;
    let row_bytes = format.row_bytes();
    let src_stride = source_stride(row_bytes, height, data.len());
    if src_stride != format.stride() {
        log::debug!("Frame rows are packed at {} bytes, not {}", src_stride, format.stride());
    }

    for i in 0..height {
        let start = i * src_stride;
        let Some(src) = data.get(start..start + row_bytes) else {
            return Err(DibError::corrupt(
                format!(
                    "frame holds {} bytes, {} of {} rows complete",
                    data.len(),
                    i,
                    height
                ),
                raster,
            ));
        };
        let y = if format.top_down { i } else { height - 1 - i };
        if let Some(dst) = raster.row_mut(y as u32) {
            dst.copy_from_slice(src);
        }
    }

    Ok(raster)
}

/// Pick the source row pitch that fits `len` bytes
fn source_stride(row_bytes: usize, height: usize, len: usize) -> usize {
    let dword = (row_bytes + 3) & !3;
    let word = (row_bytes + 1) & !1;
    let needed = |pitch: usize| pitch * (height - 1) + row_bytes;

    if len >= needed(dword) {
        dword
    } else if len >= needed(word) {
        word
    } else if len >= needed(row_bytes) {
        row_bytes
    } else {
        dword
    }
}
