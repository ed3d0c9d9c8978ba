//! AVI file facade and frame iteration

use crate::chunks::{chunk_ids, read_bytes, Chunk, ChunkCursor, FourCC};
use crate::config::AviConfig;
use crate::error::{AviError, Result};
use crate::header::{HeaderParser, Headers, StreamDescriptor};
use crate::index::{IndexBuilder, IndexRecord, IndexTable, MoviList};
use crate::types::AviHeader;
use avidecode_dib::{FrameDecoder, Raster};
use byteorder::{LittleEndian, ReadBytesExt};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::iter::FusedIterator;
use std::ops::Range;
use std::path::Path;

/// A decoded video frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// Position in the stream's index
    pub number: usize,
    /// Index keyframe flag
    pub keyframe: bool,
    /// Decoded pixels, top row first
    pub raster: Raster,
}

impl VideoFrame {
    /// Take the raster
    pub fn into_raster(self) -> Raster {
        self.raster
    }
}

/// An open AVI file.
///
/// Headers and the index are read once by [`open`](Self::open); frames are
/// read and decoded on demand. The byte source is only touched for the
/// duration of a single frame read, so any number of [`Frames`] iterators
/// may be alive at once. Rasters handed out stay valid after
/// [`close`](Self::close).
pub struct AviFile<R> {
    source: RefCell<Option<R>>,
    header: AviHeader,
    streams: Vec<StreamDescriptor>,
    index: IndexTable,
    odml_total_frames: Option<u32>,
    segments: usize,
    file_len: u64,
}

impl AviFile<BufReader<File>> {
    /// Open the file at `path` with default settings
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::open(BufReader::new(file))
    }
}

impl<R: Read + Seek> AviFile<R> {
    /// Open with default settings
    pub fn open(source: R) -> Result<Self> {
        Self::open_with(source, AviConfig::default())
    }

    /// Read headers and build the index
    pub fn open_with(mut source: R, config: AviConfig) -> Result<Self> {
        let file_len = source.seek(SeekFrom::End(0))?;

        let first = match read_riff_header(&mut source, 0, file_len)? {
            Some(segment) if segment.form == chunk_ids::AVI => segment,
            _ => return Err(AviError::NotARiffFile),
        };
        log::debug!("Parsing AVI file, size: {}", file_len);

        let mut walk = SegmentWalk::default();
        walk.walk(&mut source, first.children.clone(), true)?;
        let mut segments = 1;

        // OpenDML continuation segments
        let mut next = first.next;
        while next < file_len {
            match read_riff_header(&mut source, next, file_len)? {
                Some(segment) if segment.form == chunk_ids::AVIX => {
                    log::debug!("Found AVIX segment at offset {}", next);
                    walk.walk(&mut source, segment.children.clone(), false)?;
                    segments += 1;
                    next = segment.next;
                }
                _ => {
                    log::debug!("Ignoring {} trailing bytes", file_len - next);
                    break;
                }
            }
        }

        let Headers {
            header,
            streams,
            super_indexes,
            odml_total_frames,
        } = walk.headers.ok_or(AviError::MissingHeader("hdrl"))?;
        if walk.movi.is_empty() {
            log::warn!("File has no movi list");
        }

        let index = IndexBuilder::new(&mut source, &walk.movi, streams.len(), file_len, &config)
            .build(
                walk.idx1.as_deref(),
                &super_indexes,
                header.flags.must_use_index,
            )?;

        Ok(AviFile {
            source: RefCell::new(Some(source)),
            header,
            streams,
            index,
            odml_total_frames,
            segments,
            file_len,
        })
    }

    /// Get AVI header
    pub fn header(&self) -> &AviHeader {
        &self.header
    }

    /// Get stream count
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Get stream descriptor
    pub fn stream_descriptor(&self, index: usize) -> Option<&StreamDescriptor> {
        self.streams.get(index)
    }

    /// Get all streams
    pub fn streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    /// Get video stream (first one)
    pub fn video_stream(&self) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.is_video())
    }

    /// Get total frames (including ODML extension)
    pub fn total_frames(&self) -> u64 {
        self.odml_total_frames
            .unwrap_or(self.header.total_frames) as u64
    }

    /// Number of RIFF segments (1 + AVIX continuations)
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    /// Full index table
    pub fn index_table(&self) -> &IndexTable {
        &self.index
    }

    /// Index records of `stream` in presentation order
    pub fn index(&self, stream: usize) -> Result<&[IndexRecord]> {
        self.descriptor(stream)?;
        Ok(self.index.records(stream).unwrap_or(&[]))
    }

    /// Lazily decode the frames of `stream` in index order.
    ///
    /// Each call starts again from the first record. Failures are reported
    /// per frame; a corrupt frame carries its partial raster and iteration
    /// continues with the next one.
    pub fn frames(&self, stream: usize) -> Result<Frames<'_, R>> {
        self.ensure_open()?;
        let descriptor = self.descriptor(stream)?;

        Ok(Frames {
            file: self,
            stream,
            decoder: descriptor.decoder(),
            records: self.index.records(stream).unwrap_or(&[]),
            next: 0,
        })
    }

    /// Decode frame `number` of `stream`
    pub fn frame(&self, stream: usize, number: usize) -> Result<VideoFrame> {
        self.ensure_open()?;
        let descriptor = self.descriptor(stream)?;
        let record = self.record(stream, number)?;
        self.decode_record(stream, number, record, &descriptor.decoder())
    }

    /// Raw payload of record `number` of `stream`, for any media type
    pub fn read_chunk(&self, stream: usize, number: usize) -> Result<Vec<u8>> {
        self.ensure_open()?;
        self.descriptor(stream)?;
        let record = self.record(stream, number)?;
        self.read_record(record)
    }

    /// Release the byte source
    pub fn close(&mut self) {
        if self.source.get_mut().take().is_some() {
            log::debug!("Closed AVI file");
        }
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.source.borrow().is_none()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(AviError::UseAfterClose);
        }
        Ok(())
    }

    fn descriptor(&self, stream: usize) -> Result<&StreamDescriptor> {
        self.streams.get(stream).ok_or(AviError::InvalidStream(stream))
    }

    fn record(&self, stream: usize, number: usize) -> Result<&IndexRecord> {
        self.index
            .records(stream)
            .and_then(|records| records.get(number))
            .ok_or(AviError::FrameOutOfRange {
                stream,
                frame: number,
            })
    }

    fn read_record(&self, record: &IndexRecord) -> Result<Vec<u8>> {
        if record.range().end > self.file_len {
            return Err(AviError::malformed(
                record.offset,
                format!("{} byte frame chunk ends past the end of file", record.size),
            ));
        }

        let mut source = self.source.borrow_mut();
        let src = source.as_mut().ok_or(AviError::UseAfterClose)?;
        read_bytes(src, record.offset, record.size as usize)
    }

    fn decode_record(
        &self,
        stream: usize,
        number: usize,
        record: &IndexRecord,
        decoder: &std::result::Result<FrameDecoder, String>,
    ) -> Result<VideoFrame> {
        let decoder = decoder
            .as_ref()
            .map_err(|reason| AviError::UnsupportedStream {
                stream,
                reason: reason.clone(),
            })?;

        let data = self.read_record(record)?;
        let raster = decoder
            .decode(&data)
            .map_err(|e| AviError::from_dib(stream, number, e))?;

        Ok(VideoFrame {
            number,
            keyframe: record.keyframe,
            raster,
        })
    }
}

impl<R> std::fmt::Debug for AviFile<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AviFile")
            .field("header", &self.header)
            .field("streams", &self.streams.len())
            .field("records", &self.index.total_records())
            .field("segments", &self.segments)
            .finish()
    }
}

/// Lazy sequence of decoded frames of one stream
pub struct Frames<'a, R> {
    file: &'a AviFile<R>,
    stream: usize,
    decoder: std::result::Result<FrameDecoder, String>,
    records: &'a [IndexRecord],
    next: usize,
}

impl<'a, R: Read + Seek> Iterator for Frames<'a, R> {
    type Item = Result<VideoFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.get(self.next)?;
        let number = self.next;
        self.next += 1;
        Some(
            self.file
                .decode_record(self.stream, number, record, &self.decoder),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.records.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl<'a, R: Read + Seek> ExactSizeIterator for Frames<'a, R> {}

impl<'a, R: Read + Seek> FusedIterator for Frames<'a, R> {}

/// A top-level RIFF form
struct RiffSegment {
    form: FourCC,
    children: Range<u64>,
    /// Offset just past the declared segment
    next: u64,
}

/// Read a `RIFF` header at `offset`; `None` if there is none
fn read_riff_header<R: Read + Seek>(
    src: &mut R,
    offset: u64,
    file_len: u64,
) -> Result<Option<RiffSegment>> {
    if file_len < offset + 12 {
        return Ok(None);
    }

    src.seek(SeekFrom::Start(offset))?;
    let mut id = [0u8; 4];
    src.read_exact(&mut id)?;
    if FourCC(id) != chunk_ids::RIFF {
        return Ok(None);
    }
    let size = src.read_u32::<LittleEndian>()? as u64;
    let mut form = [0u8; 4];
    src.read_exact(&mut form)?;

    let declared_end = offset + 8 + size;
    let end = if declared_end > file_len {
        log::warn!(
            "RIFF '{}' at {} declares {} bytes, file ends after {}",
            FourCC(form),
            offset,
            size,
            file_len - offset - 8
        );
        file_len
    } else {
        declared_end
    };

    Ok(Some(RiffSegment {
        form: FourCC(form),
        children: (offset + 12).min(end)..end,
        next: declared_end + (size & 1),
    }))
}

/// State gathered while walking the top level of each RIFF segment
#[derive(Default)]
struct SegmentWalk {
    headers: Option<Headers>,
    idx1: Option<Vec<u8>>,
    movi: Vec<MoviList>,
}

impl SegmentWalk {
    fn walk<R: Read + Seek>(
        &mut self,
        src: &mut R,
        children: Range<u64>,
        first: bool,
    ) -> Result<()> {
        let mut cursor = ChunkCursor::new(children);

        loop {
            let chunk = match cursor.next_chunk(src) {
                Ok(Some(chunk)) => chunk,
                Ok(None) => return Ok(()),
                Err(e @ AviError::MalformedContainer { .. }) if self.headers.is_some() => {
                    // truncated file: keep the part of the last chunk that is present
                    log::warn!("{}, salvaging the remainder", e);
                    match cursor.next_chunk_clamped(src) {
                        Ok(Some(chunk)) if chunk.id == chunk_ids::IDX1 => return Err(e),
                        Ok(Some(chunk)) => self.visit_salvaged(src, chunk, first)?,
                        Ok(None) => {}
                        Err(e) if !e.is_fatal() => log::warn!("Nothing to salvage: {}", e),
                        Err(e) => return Err(e),
                    }
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            self.visit(src, chunk, first)?;
        }
    }

    fn visit_salvaged<R: Read + Seek>(
        &mut self,
        src: &mut R,
        chunk: Chunk,
        first: bool,
    ) -> Result<()> {
        // of a cut-off chunk, only a movi list is kept
        if chunk.id == chunk_ids::LIST {
            match chunk.descend(src) {
                Ok((kind, _)) if kind == chunk_ids::MOVI => {}
                Ok((kind, _)) => {
                    log::warn!("Dropping truncated '{}' list", kind);
                    return Ok(());
                }
                Err(e) if !e.is_fatal() => {
                    log::warn!("Dropping truncated list: {}", e);
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        } else {
            log::warn!("Dropping truncated '{}' chunk", chunk.id);
            return Ok(());
        }

        match self.visit(src, chunk, first) {
            Err(e) if !e.is_fatal() => {
                log::warn!("Dropping truncated '{}' chunk: {}", chunk.id, e);
                Ok(())
            }
            other => other,
        }
    }

    fn visit<R: Read + Seek>(&mut self, src: &mut R, chunk: Chunk, first: bool) -> Result<()> {
        if chunk.id == chunk_ids::LIST {
            let (kind, inner) = chunk.descend(src)?;
            match kind {
                k if k == chunk_ids::HDRL && first && self.headers.is_none() => {
                    self.headers = Some(HeaderParser::new(src).parse(inner)?);
                }
                k if k == chunk_ids::MOVI => {
                    log::debug!(
                        "Found movi list at offset {}, size {}",
                        chunk.offset,
                        chunk.size
                    );
                    self.movi.push(MoviList {
                        base: chunk.payload_start(),
                        children: inner.position()..inner.end(),
                    });
                }
                _ => log::debug!("Skipping list: {}", kind),
            }
        } else if chunk.id == chunk_ids::IDX1 && first {
            let data = chunk.read_payload(src)?;
            log::debug!("Parsed {} index entries", data.len() / 16);
            self.idx1 = Some(data);
        } else {
            log::debug!("Skipping chunk: {}", chunk.id);
        }

        Ok(())
    }
}
