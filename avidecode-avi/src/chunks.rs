//! RIFF chunk walking
//!
//! A [`ChunkCursor`] covers a byte range of the source and yields the chunk
//! headers inside it one at a time. Payloads are never read eagerly: a
//! [`Chunk`] only records where its payload lives.

use crate::error::{AviError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;

/// Size of a chunk header (id + length)
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// FourCC (Four Character Code) identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create from bytes
    pub fn new(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }

    /// Get as string
    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.0).to_string()
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl std::fmt::Debug for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FourCC(\"{}\")", self.as_str())
    }
}

impl std::fmt::Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }
}

/// Well-known chunk IDs
pub mod chunk_ids {
    use super::FourCC;

    pub const RIFF: FourCC = FourCC(*b"RIFF");
    pub const AVI: FourCC = FourCC(*b"AVI ");
    pub const AVIX: FourCC = FourCC(*b"AVIX");
    pub const LIST: FourCC = FourCC(*b"LIST");
    pub const HDRL: FourCC = FourCC(*b"hdrl");
    pub const AVIH: FourCC = FourCC(*b"avih");
    pub const STRL: FourCC = FourCC(*b"strl");
    pub const STRH: FourCC = FourCC(*b"strh");
    pub const STRF: FourCC = FourCC(*b"strf");
    pub const STRN: FourCC = FourCC(*b"strn");
    pub const STRD: FourCC = FourCC(*b"strd");
    pub const INDX: FourCC = FourCC(*b"indx");
    pub const MOVI: FourCC = FourCC(*b"movi");
    pub const REC: FourCC = FourCC(*b"rec ");
    pub const IDX1: FourCC = FourCC(*b"idx1");
    pub const JUNK: FourCC = FourCC(*b"JUNK");
    pub const ODML: FourCC = FourCC(*b"odml");
    pub const DMLH: FourCC = FourCC(*b"dmlh");
}

/// Chunk identifier with stream number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkId {
    /// Raw FourCC
    pub fourcc: FourCC,
    /// Stream number (if applicable)
    pub stream_number: Option<u16>,
    /// Chunk type
    pub chunk_type: ChunkType,
}

impl ChunkId {
    /// Parse chunk ID from FourCC
    pub fn parse(fourcc: FourCC) -> Self {
        let bytes = fourcc.as_bytes();

        // Stream chunks look like "00dc", "01wb"
        if bytes[0].is_ascii_digit() && bytes[1].is_ascii_digit() {
            let stream_num = ((bytes[0] - b'0') as u16) * 10 + ((bytes[1] - b'0') as u16);

            let chunk_type = match &bytes[2..4] {
                b"dc" | b"DC" => ChunkType::VideoCompressed,
                b"db" | b"DB" => ChunkType::VideoUncompressed,
                b"wb" | b"WB" => ChunkType::Audio,
                b"tx" | b"TX" => ChunkType::Text,
                b"ix" | b"IX" => ChunkType::Index,
                b"pc" | b"PC" => ChunkType::PaletteChange,
                _ => ChunkType::Unknown,
            };

            ChunkId {
                fourcc,
                stream_number: Some(stream_num),
                chunk_type,
            }
        } else {
            ChunkId {
                fourcc,
                stream_number: None,
                chunk_type: ChunkType::Unknown,
            }
        }
    }

    /// Stream number of a chunk that carries presentation data
    pub fn data_stream(&self) -> Option<usize> {
        match self.chunk_type {
            ChunkType::Index | ChunkType::PaletteChange => None,
            _ => self.stream_number.map(usize::from),
        }
    }
}

/// Chunk type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    /// Compressed video frame
    VideoCompressed,
    /// Uncompressed video frame
    VideoUncompressed,
    /// Audio data
    Audio,
    /// Text/subtitle
    Text,
    /// OpenDML standard index
    Index,
    /// Palette change
    PaletteChange,
    /// Unknown type
    Unknown,
}

/// A chunk header and the location of its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk ID
    pub id: FourCC,
    /// Declared payload size, without padding
    pub size: u32,
    /// File offset of the chunk header
    pub offset: u64,
}

impl Chunk {
    /// File offset of the first payload byte
    pub fn payload_start(&self) -> u64 {
        self.offset + CHUNK_HEADER_SIZE
    }

    /// File offset one past the last payload byte
    pub fn payload_end(&self) -> u64 {
        self.payload_start() + self.size as u64
    }

    /// Payload byte range
    pub fn payload(&self) -> Range<u64> {
        self.payload_start()..self.payload_end()
    }

    /// Offset of the next sibling, after any pad byte
    pub fn padded_end(&self) -> u64 {
        self.payload_start() + ((self.size as u64 + 1) & !1)
    }

    /// `LIST` or `RIFF`: the payload starts with a form type and holds chunks
    pub fn is_list(&self) -> bool {
        self.id == chunk_ids::LIST || self.id == chunk_ids::RIFF
    }

    /// Enter a list, returning its type tag and a cursor over its children
    pub fn descend<R: Read + Seek>(&self, src: &mut R) -> Result<(FourCC, ChunkCursor)> {
        if !self.is_list() {
            return Err(AviError::malformed(
                self.offset,
                format!("cannot descend into '{}' chunk", self.id),
            ));
        }
        if self.size < 4 {
            return Err(AviError::malformed(
                self.offset,
                format!("list of {} bytes has no type tag", self.size),
            ));
        }

        src.seek(SeekFrom::Start(self.payload_start()))?;
        let mut list_type = [0u8; 4];
        src.read_exact(&mut list_type)?;

        Ok((
            FourCC(list_type),
            ChunkCursor::new(self.payload_start() + 4..self.payload_end()),
        ))
    }

    /// Read the whole payload
    pub fn read_payload<R: Read + Seek>(&self, src: &mut R) -> Result<Vec<u8>> {
        read_bytes(src, self.payload_start(), self.size as usize)
    }
}

/// Position inside a byte range of sibling chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCursor {
    pos: u64,
    end: u64,
}

impl ChunkCursor {
    /// Cursor over `range`
    pub fn new(range: Range<u64>) -> Self {
        ChunkCursor {
            pos: range.start,
            end: range.end,
        }
    }

    /// Offset of the next chunk header
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// End of the scope
    pub fn end(&self) -> u64 {
        self.end
    }

    /// No chunks remain
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.end
    }

    /// Read the next chunk header and step past its payload.
    ///
    /// Returns `None` once the scope is consumed. A header or payload
    /// crossing the end of the scope is `MalformedContainer` and leaves
    /// the cursor where it was.
    pub fn next_chunk<R: Read + Seek>(&mut self, src: &mut R) -> Result<Option<Chunk>> {
        let Some(chunk) = self.read_header(src)? else {
            return Ok(None);
        };

        if chunk.payload_end() > self.end {
            return Err(AviError::malformed(
                chunk.offset,
                format!(
                    "chunk '{}' declares {} bytes but only {} remain in its scope",
                    chunk.id,
                    chunk.size,
                    self.end - chunk.payload_start()
                ),
            ));
        }

        // a pad byte that would fall past the scope is tolerated
        self.pos = chunk.padded_end().min(self.end);
        Ok(Some(chunk))
    }

    /// Like [`next_chunk`](Self::next_chunk), but a payload overrunning the
    /// scope is cut at the scope end and the cursor is exhausted.
    pub fn next_chunk_clamped<R: Read + Seek>(&mut self, src: &mut R) -> Result<Option<Chunk>> {
        let Some(mut chunk) = self.read_header(src)? else {
            return Ok(None);
        };

        if chunk.payload_end() > self.end {
            let available = self.end - chunk.payload_start();
            log::warn!(
                "Chunk '{}' at {} declares {} bytes, truncating to {}",
                chunk.id,
                chunk.offset,
                chunk.size,
                available
            );
            chunk.size = available as u32;
            self.pos = self.end;
        } else {
            self.pos = chunk.padded_end().min(self.end);
        }

        Ok(Some(chunk))
    }

    fn read_header<R: Read + Seek>(&self, src: &mut R) -> Result<Option<Chunk>> {
        if self.is_exhausted() {
            return Ok(None);
        }
        if self.end - self.pos < CHUNK_HEADER_SIZE {
            return Err(AviError::malformed(
                self.pos,
                format!(
                    "{} trailing bytes cannot hold a chunk header",
                    self.end - self.pos
                ),
            ));
        }

        src.seek(SeekFrom::Start(self.pos))?;
        let mut id = [0u8; 4];
        src.read_exact(&mut id)?;
        let size = src.read_u32::<LittleEndian>()?;

        Ok(Some(Chunk {
            id: FourCC(id),
            size,
            offset: self.pos,
        }))
    }
}

/// Read `len` bytes at `offset`
pub fn read_bytes<R: Read + Seek>(src: &mut R, offset: u64, len: usize) -> Result<Vec<u8>> {
    src.seek(SeekFrom::Start(offset))?;
    let mut data = vec![0u8; len];
    src.read_exact(&mut data)?;
    Ok(data)
}

/// Read the four bytes at `offset`, or `None` past the end of the source
pub fn peek_fourcc<R: Read + Seek>(src: &mut R, offset: u64) -> Result<Option<FourCC>> {
    src.seek(SeekFrom::Start(offset))?;
    let mut id = [0u8; 4];
    match src.read_exact(&mut id) {
        Ok(()) => Ok(Some(FourCC(id))),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}
