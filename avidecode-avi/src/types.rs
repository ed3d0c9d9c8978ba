//! AVI type definitions

use avidecode_dib::{BitmapFormat, Compression, Palette};

/// AVI main header (avih chunk)
#[derive(Debug, Clone, Default)]
pub struct AviHeader {
    /// Microseconds per frame
    pub microseconds_per_frame: u32,
    /// Maximum bytes per second
    pub max_bytes_per_sec: u32,
    /// Padding granularity
    pub padding_granularity: u32,
    /// AVI flags
    pub flags: AviFlags,
    /// Total number of frames in the first RIFF segment
    pub total_frames: u32,
    /// Initial frames (for interleaved files)
    pub initial_frames: u32,
    /// Number of streams
    pub streams: u32,
    /// Suggested buffer size
    pub suggested_buffer_size: u32,
    /// Canvas width
    pub width: u32,
    /// Canvas height
    pub height: u32,
}

impl AviHeader {
    /// Size of the avih payload
    pub const SIZE: usize = 56;

    /// Calculate frame rate in fps
    pub fn frame_rate(&self) -> f64 {
        if self.microseconds_per_frame > 0 {
            1_000_000.0 / self.microseconds_per_frame as f64
        } else {
            0.0
        }
    }

    /// Calculate duration in seconds
    pub fn duration(&self) -> f64 {
        (self.total_frames as f64 * self.microseconds_per_frame as f64) / 1_000_000.0
    }
}

/// AVI header flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AviFlags {
    /// File has an idx1 index
    pub has_index: bool,
    /// Frame order must come from the index
    pub must_use_index: bool,
    /// File is interleaved
    pub is_interleaved: bool,
    /// Trust chunk type for keyframe detection
    pub trust_chunk_type: bool,
    /// File was captured
    pub was_captured: bool,
    /// File is copyrighted
    pub is_copyrighted: bool,
}

impl AviFlags {
    pub const HAS_INDEX: u32 = 0x10;
    pub const MUST_USE_INDEX: u32 = 0x20;
    pub const IS_INTERLEAVED: u32 = 0x100;
    pub const TRUST_CK_TYPE: u32 = 0x800;
    pub const WAS_CAPTURE_FILE: u32 = 0x10000;
    pub const COPYRIGHTED: u32 = 0x20000;

    pub fn from_u32(value: u32) -> Self {
        AviFlags {
            has_index: (value & Self::HAS_INDEX) != 0,
            must_use_index: (value & Self::MUST_USE_INDEX) != 0,
            is_interleaved: (value & Self::IS_INTERLEAVED) != 0,
            trust_chunk_type: (value & Self::TRUST_CK_TYPE) != 0,
            was_captured: (value & Self::WAS_CAPTURE_FILE) != 0,
            is_copyrighted: (value & Self::COPYRIGHTED) != 0,
        }
    }
}

/// Stream header (strh chunk)
#[derive(Debug, Clone)]
pub struct StreamHeader {
    /// Stream type (vids, auds, txts, mids)
    pub stream_type: StreamType,
    /// FourCC handler/codec
    pub handler: [u8; 4],
    /// Stream flags
    pub flags: u32,
    /// Priority
    pub priority: u16,
    /// Language
    pub language: u16,
    /// Initial frames
    pub initial_frames: u32,
    /// Time scale
    pub scale: u32,
    /// Rate (samples per second = rate/scale)
    pub rate: u32,
    /// Start time
    pub start: u32,
    /// Length (number of frames or audio samples)
    pub length: u32,
    /// Suggested buffer size
    pub suggested_buffer_size: u32,
    /// Quality (0-10000)
    pub quality: u32,
    /// Sample size (0 for variable)
    pub sample_size: u32,
    /// Destination rectangle, absent in 48-byte headers
    pub frame: Option<Rect>,
}

impl StreamHeader {
    /// Shortest valid strh payload (no frame rectangle)
    pub const MIN_SIZE: usize = 48;
}

/// Stream type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Video,
    Audio,
    Text,
    Midi,
    Unknown([u8; 4]),
}

impl StreamType {
    pub fn from_fourcc(fourcc: &[u8; 4]) -> Self {
        match fourcc {
            b"vids" => StreamType::Video,
            b"auds" => StreamType::Audio,
            b"txts" => StreamType::Text,
            b"mids" => StreamType::Midi,
            _ => StreamType::Unknown(*fourcc),
        }
    }

    pub fn to_fourcc(self) -> [u8; 4] {
        match self {
            StreamType::Video => *b"vids",
            StreamType::Audio => *b"auds",
            StreamType::Text => *b"txts",
            StreamType::Midi => *b"mids",
            StreamType::Unknown(fourcc) => fourcc,
        }
    }
}

/// Rectangle structure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Video format (BITMAPINFOHEADER)
#[derive(Debug, Clone)]
pub struct VideoFormat {
    /// Structure size
    pub size: u32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels (negative for top-down)
    pub height: i32,
    /// Number of planes (always 1)
    pub planes: u16,
    /// Bits per pixel
    pub bit_count: u16,
    /// Compression code or FourCC
    pub compression: [u8; 4],
    /// Image size in bytes
    pub image_size: u32,
    /// Horizontal resolution
    pub x_pels_per_meter: i32,
    /// Vertical resolution
    pub y_pels_per_meter: i32,
    /// Colors used
    pub colors_used: u32,
    /// Important colors
    pub colors_important: u32,
    /// Colour table following the header
    pub palette: Palette,
    /// Bytes after the colour table
    pub extra: Vec<u8>,
}

impl VideoFormat {
    /// Size of a BITMAPINFOHEADER
    pub const HEADER_SIZE: usize = 40;

    /// Get absolute height (handles negative for top-down)
    pub fn abs_height(&self) -> u32 {
        self.height.unsigned_abs()
    }

    /// Check if image is top-down
    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }

    /// Interpreted compression
    pub fn compression(&self) -> Compression {
        Compression::from_raw(self.compression)
    }

    /// Number of colour table entries the header calls for
    pub fn palette_entries(&self) -> usize {
        if self.colors_used > 0 {
            self.colors_used as usize
        } else if (1..=8).contains(&self.bit_count) {
            1usize << self.bit_count
        } else {
            0
        }
    }

    /// Geometry and encoding for the frame decoder
    pub fn bitmap_format(&self) -> BitmapFormat {
        BitmapFormat::from_header(self.width, self.height, self.bit_count, self.compression())
            .with_palette(self.palette.clone())
    }
}

/// Audio format (WAVEFORMATEX)
#[derive(Debug, Clone)]
pub struct AudioFormat {
    /// Format tag
    pub format_tag: u16,
    /// Number of channels
    pub channels: u16,
    /// Samples per second
    pub samples_per_sec: u32,
    /// Average bytes per second
    pub avg_bytes_per_sec: u32,
    /// Block alignment
    pub block_align: u16,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// Extra codec-specific data
    pub extra_data: Vec<u8>,
}

impl AudioFormat {
    /// Size of a WAVEFORMAT without the cbSize field
    pub const MIN_SIZE: usize = 16;

    /// Get format name
    pub fn format_name(&self) -> &'static str {
        match self.format_tag {
            0x0001 => "PCM",
            0x0002 => "MS ADPCM",
            0x0003 => "IEEE Float",
            0x0006 => "A-Law",
            0x0007 => "mu-Law",
            0x0011 => "IMA ADPCM",
            0x0055 => "MP3",
            0x00FF => "AAC",
            0x2000 => "AC-3",
            0xFFFE => "Extensible",
            _ => "Unknown",
        }
    }
}
