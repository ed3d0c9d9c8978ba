//! Bitmap format descriptions

use std::fmt;

/// Bitmap compression (`biCompression`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed (`BI_RGB`)
    Rgb,
    /// 8-bit run-length encoding (`BI_RLE8`)
    Rle8,
    /// 4-bit run-length encoding (`BI_RLE4`)
    Rle4,
    /// Uncompressed with colour masks (`BI_BITFIELDS`)
    Bitfields,
    /// Embedded JPEG (`BI_JPEG`)
    Jpeg,
    /// Embedded PNG (`BI_PNG`)
    Png,
    /// Any other code or codec FourCC
    FourCC([u8; 4]),
}

impl Compression {
    /// Interpret the raw little-endian `biCompression` field
    pub fn from_raw(raw: [u8; 4]) -> Self {
        match u32::from_le_bytes(raw) {
            0 => Compression::Rgb,
            1 => Compression::Rle8,
            2 => Compression::Rle4,
            3 => Compression::Bitfields,
            4 => Compression::Jpeg,
            5 => Compression::Png,
            _ => match &raw {
                b"DIB " | b"RGB " | b"RAW " => Compression::Rgb,
                b"RLE8" => Compression::Rle8,
                b"RLE4" => Compression::Rle4,
                _ => Compression::FourCC(raw),
            },
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Rgb => write!(f, "RGB"),
            Compression::Rle8 => write!(f, "RLE8"),
            Compression::Rle4 => write!(f, "RLE4"),
            Compression::Bitfields => write!(f, "BITFIELDS"),
            Compression::Jpeg => write!(f, "JPEG"),
            Compression::Png => write!(f, "PNG"),
            Compression::FourCC(raw) if raw.iter().all(|b| b.is_ascii_graphic() || *b == b' ') => {
                write!(f, "{}", String::from_utf8_lossy(raw))
            }
            Compression::FourCC(raw) => write!(f, "0x{:08X}", u32::from_le_bytes(*raw)),
        }
    }
}

/// Colour table of an indexed bitmap, stored as RGB triples
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<[u8; 3]>,
}

impl Palette {
    /// Parse up to `count` `RGBQUAD` (blue, green, red, reserved) entries.
    ///
    /// Parsing stops early if `data` runs out.
    pub fn from_bgrx(data: &[u8], count: usize) -> Self {
        let entries = data
            .chunks_exact(4)
            .take(count)
            .map(|quad| [quad[2], quad[1], quad[0]])
            .collect();
        Palette { entries }
    }

    /// Number of colours
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no colours
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Colour at `index`
    pub fn get(&self, index: u8) -> Option<[u8; 3]> {
        self.entries.get(index as usize).copied()
    }

    /// All colours in table order
    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }
}

/// Geometry and encoding of the bitmaps carried by a video stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapFormat {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels (always positive)
    pub height: u32,
    /// Rows are stored top row first (negative `biHeight`)
    pub top_down: bool,
    /// Bits per pixel
    pub bit_count: u16,
    /// Compression
    pub compression: Compression,
    /// Colour table, empty for true-colour formats
    pub palette: Palette,
}

impl BitmapFormat {
    /// Bottom-up bitmap without colour table
    pub fn new(width: u32, height: u32, bit_count: u16, compression: Compression) -> Self {
        BitmapFormat {
            width,
            height,
            top_down: false,
            bit_count,
            compression,
            palette: Palette::default(),
        }
    }

    /// Build from signed `BITMAPINFOHEADER` dimensions
    pub fn from_header(width: i32, height: i32, bit_count: u16, compression: Compression) -> Self {
        BitmapFormat {
            width: width.unsigned_abs(),
            height: height.unsigned_abs(),
            top_down: height < 0,
            bit_count,
            compression,
            palette: Palette::default(),
        }
    }

    /// Attach a colour table
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Bytes of pixel data in one row, without padding
    pub fn row_bytes(&self) -> usize {
        (self.width as usize * self.bit_count as usize + 7) / 8
    }

    /// Row length of the stored bitmap, padded to a 4-byte boundary
    pub fn stride(&self) -> usize {
        (self.row_bytes() + 3) & !3
    }

    /// Whether a decoder exists for this format
    pub fn is_supported(&self) -> bool {
        match self.compression {
            Compression::Rgb => matches!(self.bit_count, 1 | 4 | 8 | 16 | 24 | 32),
            Compression::Rle8 => self.bit_count == 8,
            _ => false,
        }
    }
}
