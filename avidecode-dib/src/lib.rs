//! Device-Independent Bitmap Frames
//!
//! Decoding of the bitmap frames carried by AVI video streams into plain
//! pixel rasters.
//!
//! # Features
//!
//! - Uncompressed (`BI_RGB`) frames at 1, 4, 8, 16, 24 and 32 bits per pixel
//! - Microsoft RLE8 (`BI_RLE8`) run-length frames
//! - Bottom-up and top-down source rows, always returned top-down
//! - Partial rasters recovered from truncated or corrupt frames
//!
//! Pixel bytes are copied as stored: indexed frames stay palette indices
//! and true-colour frames stay BGR.
//!
//! # Example
//!
//! ```
//! use avidecode_dib::{BitmapFormat, Compression, FrameDecoder};
//!
//! let format = BitmapFormat::new(2, 2, 8, Compression::Rle8);
//! let decoder = FrameDecoder::new(format).unwrap();
//!
//! let raster = decoder.decode(&[0x02, 0x05, 0x00, 0x00, 0x02, 0x05, 0x00, 0x01]).unwrap();
//! assert_eq!(raster.to_packed(), vec![5, 5, 5, 5]);
//! ```

mod bitmap;
mod decoder;
mod error;
mod raster;
mod rle8;
mod types;

pub use bitmap::decode_uncompressed;
pub use decoder::FrameDecoder;
pub use error::{DibError, Result};
pub use raster::Raster;
pub use rle8::decode_rle8;
pub use types::{BitmapFormat, Compression, Palette};
