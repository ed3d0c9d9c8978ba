//! Microsoft RLE8 decompression
//!
//! The stream is a sequence of two-byte opcodes. A non-zero first byte is a
//! run `(count, value)`; a zero first byte is an escape selected by the
//! second byte:
//!
//! | Second byte | Meaning                                          |
//! |-------------|--------------------------------------------------|
//! | `0x00`      | end of line                                      |
//! | `0x01`      | end of bitmap                                    |
//! | `0x02`      | delta: next two bytes are `dx`, `dy`             |
//! | `n >= 3`    | literal: next `n` bytes, padded to an even count |
//!
//! Rows are coded bottom-up; the decoder writes them into a top-down raster.

use crate::error::{DibError, Result};
use crate::raster::Raster;

const ESCAPE: u8 = 0x00;
const END_OF_LINE: u8 = 0x00;
const END_OF_BITMAP: u8 = 0x01;
const DELTA: u8 = 0x02;

/// Output cursor while one chunk is decoded
struct Rle8State<'a> {
    raster: &'a mut Raster,
    /// Top-down row index; negative once the cursor has left the image
    row: i64,
    col: usize,
}

impl<'a> Rle8State<'a> {
    fn new(raster: &'a mut Raster) -> Self {
        let row = raster.height() as i64 - 1;
        Rle8State { raster, row, col: 0 }
    }

    fn above_top(&self) -> bool {
        self.row < 0
    }

    fn current_row(&mut self) -> Option<&mut [u8]> {
        if self.row < 0 {
            return None;
        }
        self.raster.row_mut(self.row as u32)
    }

    /// Write `value` `count` times, clipping at the right edge
    fn put_run(&mut self, count: usize, value: u8) {
        let col = self.col;
        if let Some(row) = self.current_row() {
            if col < row.len() {
                let end = (col + count).min(row.len());
                row[col..end].fill(value);
            }
        }
        self.col = col.saturating_add(count);
    }

    /// Copy literal pixels, clipping at the right edge
    fn put_literal(&mut self, pixels: &[u8]) {
        let col = self.col;
        if let Some(row) = self.current_row() {
            if col < row.len() {
                let end = (col + pixels.len()).min(row.len());
                row[col..end].copy_from_slice(&pixels[..end - col]);
            }
        }
        self.col = col.saturating_add(pixels.len());
    }

    fn end_of_line(&mut self) {
        self.row -= 1;
        self.col = 0;
    }

    fn delta(&mut self, dx: u8, dy: u8) {
        self.col = self.col.saturating_add(dx as usize);
        self.row -= dy as i64;
    }
}

/// Decode one RLE8 chunk into a fresh `width` x `height` 8-bit raster.
///
/// Pixels not touched by the opcode stream stay zero. On a fault the
/// raster decoded up to that point is returned inside
/// [`DibError::CorruptFrame`].
pub fn decode_rle8(data: &[u8], width: u32, height: u32) -> Result<Raster> {
    let mut raster = Raster::new(width, height, 8)?;

    match run(data, &mut raster) {
        Ok(()) => Ok(raster),
        Err(message) => {
            log::warn!("RLE8 frame truncated: {}", message);
            Err(DibError::corrupt(message, raster))
        }
    }
}

fn run(data: &[u8], raster: &mut Raster) -> std::result::Result<(), String> {
    let mut state = Rle8State::new(raster);
    let mut pos = 0;

    while pos < data.len() {
        if state.above_top() {
            if data[pos..].starts_with(&[ESCAPE, END_OF_BITMAP]) {
                return Ok(());
            }
            return Err(format!("opcodes continue above the top row at byte {}", pos));
        }

        let Some(&[count, value]) = data.get(pos..pos + 2) else {
            return Err(format!("opcode truncated at byte {}", pos));
        };
        pos += 2;

        if count != ESCAPE {
            state.put_run(count as usize, value);
            continue;
        }

        match value {
            END_OF_LINE => state.end_of_line(),
            END_OF_BITMAP => return Ok(()),
            DELTA => {
                let Some(&[dx, dy]) = data.get(pos..pos + 2) else {
                    return Err(format!("delta escape truncated at byte {}", pos - 2));
                };
                pos += 2;
                state.delta(dx, dy);
            }
            n => {
                let n = n as usize;
                let Some(pixels) = data.get(pos..pos + n) else {
                    return Err(format!(
                        "literal run of {} bytes truncated at byte {}",
                        n,
                        pos - 2
                    ));
                };
                state.put_literal(pixels);
                // odd literals carry one pad byte; a missing final pad is tolerated
                pos += n + (n & 1);
            }
        }
    }

    Ok(())
}
