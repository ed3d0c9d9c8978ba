//! AVI Reader
//!
//! This crate reads AVI (Audio Video Interleave) files and decodes their
//! video frames. AVI is based on the RIFF (Resource Interchange File Format)
//! structure.
//!
//! # Features
//!
//! - RIFF chunk walking with bounds and padding checks
//! - Main, stream and format header parsing
//! - `idx1` indexes with either offset convention
//! - OpenDML super/standard indexes and `RIFF AVIX` segments
//! - Index-less files recovered by scanning the `movi` lists
//! - Lazy frame decoding: uncompressed RGB and RLE8
//!
//! # Example
//!
//! ```no_run
//! use avidecode_avi::AviFile;
//!
//! # fn main() -> avidecode_avi::Result<()> {
//! let avi = AviFile::open_path("video.avi")?;
//! println!("Duration: {} frames", avi.total_frames());
//!
//! for frame in avi.frames(0)? {
//!     match frame {
//!         Ok(frame) => {
//!             let raster = &frame.raster;
//!             println!("frame {}: {}x{}", frame.number, raster.width(), raster.height());
//!         }
//!         Err(e) if !e.is_fatal() => eprintln!("skipping: {}", e),
//!         Err(e) => return Err(e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod chunks;
mod config;
mod error;
mod file;
mod header;
mod index;
mod types;

pub use avidecode_dib::{BitmapFormat, Compression, Palette, Raster};
pub use chunks::{chunk_ids, Chunk, ChunkCursor, ChunkId, ChunkType, FourCC};
pub use config::{AviConfig, OffsetMode};
pub use error::{AviError, Result};
pub use file::{AviFile, Frames, VideoFrame};
pub use header::StreamDescriptor;
pub use index::{parse_idx1, IndexEntry, IndexRecord, IndexSource, IndexTable};
pub use types::{AudioFormat, AviFlags, AviHeader, Rect, StreamHeader, StreamType, VideoFormat};
