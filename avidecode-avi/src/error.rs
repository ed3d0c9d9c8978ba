//! Error types for AVI reading

use avidecode_dib::{DibError, Raster};
use std::io;
use thiserror::Error;

/// Result type for AVI operations
pub type Result<T> = std::result::Result<T, AviError>;

/// Errors that can occur while opening an AVI file or decoding its frames
#[derive(Error, Debug)]
pub enum AviError {
    /// IO error from the byte source
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Leading tag is not `RIFF` with form type `AVI `
    #[error("Not a RIFF/AVI file")]
    NotARiffFile,

    /// A chunk or list declares a length that overruns its enclosing scope
    #[error("Malformed container at offset {offset}: {message}")]
    MalformedContainer { offset: u64, message: String },

    /// Required header chunk absent
    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),

    /// Stream whose media type or compression has no decoder
    #[error("Stream {stream} is not decodable: {reason}")]
    UnsupportedStream { stream: usize, reason: String },

    /// Frame data ended early or held an invalid opcode sequence.
    ///
    /// `partial` holds the rows decoded before the fault.
    #[error("Corrupt frame {frame} in stream {stream}: {message}")]
    CorruptFrame {
        stream: usize,
        frame: usize,
        message: String,
        partial: Box<Raster>,
    },

    /// The file was closed
    #[error("AVI file used after close")]
    UseAfterClose,

    /// Stream index not declared in the header list
    #[error("Invalid stream index: {0}")]
    InvalidStream(usize),

    /// Frame number past the end of the stream's index
    #[error("Frame {frame} out of range for stream {stream}")]
    FrameOutOfRange { stream: usize, frame: usize },

    /// The main header requires an index and the file has none
    #[error("File requires an index but none is present")]
    MissingIndex,
}

impl AviError {
    pub(crate) fn malformed(offset: u64, message: impl Into<String>) -> Self {
        AviError::MalformedContainer {
            offset,
            message: message.into(),
        }
    }

    /// Wrap a bitmap decoding failure for frame `frame` of `stream`
    pub(crate) fn from_dib(stream: usize, frame: usize, err: DibError) -> Self {
        match err {
            DibError::CorruptFrame { message, partial } => AviError::CorruptFrame {
                stream,
                frame,
                message,
                partial,
            },
            other => AviError::UnsupportedStream {
                stream,
                reason: other.to_string(),
            },
        }
    }

    /// Whether this error ends the whole operation.
    ///
    /// Frame-level failures (corrupt or unsupported frames, frame chunks
    /// outside the container bounds) return `false`: iteration continues
    /// with the next frame.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            AviError::MalformedContainer { .. }
                | AviError::UnsupportedStream { .. }
                | AviError::CorruptFrame { .. }
        )
    }

    /// Partially decoded raster of a corrupt frame
    pub fn partial_raster(&self) -> Option<&Raster> {
        match self {
            AviError::CorruptFrame { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// Take ownership of the partially decoded raster
    pub fn into_partial_raster(self) -> Option<Raster> {
        match self {
            AviError::CorruptFrame { partial, .. } => Some(*partial),
            _ => None,
        }
    }
}
