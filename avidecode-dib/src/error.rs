//! Error types for bitmap frame decoding

use crate::raster::Raster;
use crate::types::Compression;
use thiserror::Error;

/// Result type for bitmap decoding operations
pub type Result<T> = std::result::Result<T, DibError>;

/// Errors that can occur while decoding a bitmap frame
#[derive(Error, Debug)]
pub enum DibError {
    /// Compression / bit depth combination with no decoder
    #[error("Unsupported bitmap: compression {compression}, {bit_count} bits per pixel")]
    Unsupported {
        compression: Compression,
        bit_count: u16,
    },

    /// Width or height of zero, or a frame too large to allocate
    #[error("Invalid bitmap dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Frame data ended early or contained an invalid opcode sequence.
    ///
    /// `partial` holds every pixel decoded before the fault.
    #[error("Corrupt frame: {message}")]
    CorruptFrame {
        message: String,
        partial: Box<Raster>,
    },
}

impl DibError {
    /// Build a corrupt-frame error around the raster decoded so far
    pub fn corrupt(message: impl Into<String>, partial: Raster) -> Self {
        DibError::CorruptFrame {
            message: message.into(),
            partial: Box::new(partial),
        }
    }

    /// Partially decoded raster, if this is a corrupt-frame error
    pub fn partial_raster(&self) -> Option<&Raster> {
        match self {
            DibError::CorruptFrame { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// Take ownership of the partially decoded raster
    pub fn into_partial_raster(self) -> Option<Raster> {
        match self {
            DibError::CorruptFrame { partial, .. } => Some(*partial),
            _ => None,
        }
    }
}
