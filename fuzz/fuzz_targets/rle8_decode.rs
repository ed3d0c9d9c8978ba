#![no_main]

//! Fuzz target for RLE8 decompression.
//!
//! Decodes arbitrary opcode streams into small rasters; the decoder must
//! never panic and must always hand back a raster of the requested size.

use arbitrary::Arbitrary;
use avidecode_dib::{decode_rle8, DibError};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Rle8Input {
    width: u8,
    height: u8,
    data: Vec<u8>,
}

fuzz_target!(|input: Rle8Input| {
    if input.data.len() > 256 * 1024 {
        return;
    }

    let width = input.width as u32;
    let height = input.height as u32;

    match decode_rle8(&input.data, width, height) {
        Ok(raster) => {
            assert_eq!(raster.width(), width);
            assert_eq!(raster.height(), height);
        }
        Err(DibError::CorruptFrame { partial, .. }) => {
            assert_eq!(partial.width(), width);
            assert_eq!(partial.height(), height);
        }
        Err(DibError::InvalidDimensions { .. }) => {
            assert!(width == 0 || height == 0);
        }
        Err(e) => panic!("unexpected error: {}", e),
    }
});
