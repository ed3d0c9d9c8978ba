//! Frame index construction
//!
//! Per-stream records come from, in order of preference, the OpenDML
//! `indx`/`ix##` indexes, the legacy `idx1` chunk, or a walk over the
//! `movi` lists.

use crate::chunks::{
    chunk_ids, peek_fourcc, ChunkCursor, ChunkId, ChunkType, FourCC, CHUNK_HEADER_SIZE,
};
use crate::config::{AviConfig, OffsetMode};
use crate::error::{AviError, Result};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek};
use std::ops::Range;

/// One frame (or audio block) of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    /// Stream index
    pub stream: usize,
    /// File offset of the chunk payload
    pub offset: u64,
    /// Payload size in bytes
    pub size: u32,
    /// Decodable without earlier frames
    pub keyframe: bool,
    /// Chunk type from the chunk id
    pub chunk_type: ChunkType,
}

impl IndexRecord {
    /// Payload byte range
    pub fn range(&self) -> Range<u64> {
        self.offset..self.offset + self.size as u64
    }
}

/// Where a stream's records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSource {
    /// OpenDML super index and standard indexes
    OpenDml,
    /// Legacy `idx1` chunk
    Idx1,
    /// Sequential walk over `movi`
    Scan,
    /// No records available
    None,
}

/// AVI index entry (idx1 format)
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry {
    /// Chunk ID
    pub chunk_id: FourCC,
    /// Flags
    pub flags: u32,
    /// Offset of the chunk header, absolute or relative to `movi`
    pub offset: u32,
    /// Size of chunk data
    pub size: u32,
}

impl IndexEntry {
    /// Entry size in bytes
    pub const SIZE: usize = 16;
    /// Entry marks a `rec ` list rather than a data chunk
    pub const LIST: u32 = 0x01;
    /// Entry is a keyframe
    pub const KEYFRAME: u32 = 0x10;
    /// Entry does not count towards timing
    pub const NO_TIME: u32 = 0x100;

    /// Read from data
    pub fn read(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let mut id_bytes = [0u8; 4];
        cursor.read_exact(&mut id_bytes)?;

        Ok(IndexEntry {
            chunk_id: FourCC(id_bytes),
            flags: cursor.read_u32::<LittleEndian>()?,
            offset: cursor.read_u32::<LittleEndian>()?,
            size: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// Check if this is a keyframe
    pub fn is_keyframe(&self) -> bool {
        (self.flags & Self::KEYFRAME) != 0
    }

    /// Check if this entry marks a list
    pub fn is_list(&self) -> bool {
        (self.flags & Self::LIST) != 0
    }
}

/// Parse idx1 index
pub fn parse_idx1(data: &[u8]) -> Vec<IndexEntry> {
    if data.len() % IndexEntry::SIZE != 0 {
        log::warn!(
            "idx1 size {} is not a multiple of {}",
            data.len(),
            IndexEntry::SIZE
        );
    }

    data.chunks_exact(IndexEntry::SIZE)
        .filter_map(|entry| IndexEntry::read(entry).ok())
        .collect()
}

const AVI_INDEX_OF_INDEXES: u8 = 0x00;
const AVI_INDEX_OF_CHUNKS: u8 = 0x01;
/// Bit set in a standard index size for non-keyframes
const NON_KEYFRAME: u32 = 0x8000_0000;
const ODML_HEADER_SIZE: usize = 24;

/// Common header of `indx` and `ix##` payloads
#[derive(Debug, Clone, Copy)]
struct OdmlIndexHeader {
    longs_per_entry: u16,
    index_type: u8,
    entries_in_use: u32,
    chunk_id: FourCC,
    /// Only meaningful for standard indexes
    base_offset: u64,
}

impl OdmlIndexHeader {
    fn read(data: &[u8], offset: u64) -> Result<Self> {
        if data.len() < ODML_HEADER_SIZE {
            return Err(AviError::malformed(
                offset,
                format!(
                    "OpenDML index holds {} of {} header bytes",
                    data.len(),
                    ODML_HEADER_SIZE
                ),
            ));
        }

        let mut cursor = Cursor::new(data);
        let longs_per_entry = cursor.read_u16::<LittleEndian>()?;
        let _sub_type = cursor.read_u8()?;
        let index_type = cursor.read_u8()?;
        let entries_in_use = cursor.read_u32::<LittleEndian>()?;
        let mut chunk_id = [0u8; 4];
        cursor.read_exact(&mut chunk_id)?;
        let base_offset = cursor.read_u64::<LittleEndian>()?;

        Ok(OdmlIndexHeader {
            longs_per_entry,
            index_type,
            entries_in_use,
            chunk_id: FourCC(chunk_id),
            base_offset,
        })
    }

    /// Entry table, clamped to the bytes present
    fn entries<'d>(&self, data: &'d [u8], min_size: usize) -> impl Iterator<Item = &'d [u8]> {
        let stride = (self.longs_per_entry as usize * 4).max(min_size);
        let table = &data[ODML_HEADER_SIZE..];
        let available = table.len() / stride;
        if (self.entries_in_use as usize) > available {
            log::warn!(
                "OpenDML index '{}' declares {} entries, holds {}",
                self.chunk_id,
                self.entries_in_use,
                available
            );
        }
        table
            .chunks_exact(stride)
            .take(self.entries_in_use as usize)
            .map(move |entry| &entry[..min_size])
    }
}

/// A `movi` list: the offset of its type tag and the range of its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MoviList {
    pub base: u64,
    pub children: Range<u64>,
}

/// Per-stream ordered index records
#[derive(Debug, Clone, Default)]
pub struct IndexTable {
    streams: Vec<Vec<IndexRecord>>,
    sources: Vec<IndexSource>,
    offset_mode: Option<OffsetMode>,
}

impl IndexTable {
    /// Records of `stream` in presentation order
    pub fn records(&self, stream: usize) -> Option<&[IndexRecord]> {
        self.streams.get(stream).map(Vec::as_slice)
    }

    /// Where the records of `stream` came from
    pub fn source(&self, stream: usize) -> Option<IndexSource> {
        self.sources.get(stream).copied()
    }

    /// Convention chosen for `idx1` offsets, if `idx1` was used
    pub fn offset_mode(&self) -> Option<OffsetMode> {
        self.offset_mode
    }

    /// Number of streams covered
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Records across all streams
    pub fn total_records(&self) -> usize {
        self.streams.iter().map(Vec::len).sum()
    }
}

/// Builds an [`IndexTable`] once the headers and `movi` lists are known
pub(crate) struct IndexBuilder<'a, R> {
    src: &'a mut R,
    movi: &'a [MoviList],
    stream_count: usize,
    file_len: u64,
    config: &'a AviConfig,
}

impl<'a, R: Read + Seek> IndexBuilder<'a, R> {
    pub fn new(
        src: &'a mut R,
        movi: &'a [MoviList],
        stream_count: usize,
        file_len: u64,
        config: &'a AviConfig,
    ) -> Self {
        IndexBuilder {
            src,
            movi,
            stream_count,
            file_len,
            config,
        }
    }

    pub fn build(
        mut self,
        idx1: Option<&[u8]>,
        super_indexes: &[Option<Vec<u8>>],
        must_use_index: bool,
    ) -> Result<IndexTable> {
        let mut table = IndexTable {
            streams: vec![Vec::new(); self.stream_count],
            sources: vec![IndexSource::None; self.stream_count],
            offset_mode: None,
        };

        if self.config.prefer_odml_index {
            for (stream, indx) in super_indexes.iter().enumerate().take(self.stream_count) {
                let Some(indx) = indx else { continue };
                match self.read_odml(stream, indx) {
                    Ok(records) => {
                        table.streams[stream] = records;
                        table.sources[stream] = IndexSource::OpenDml;
                    }
                    Err(e) if !e.is_fatal() => {
                        log::warn!("Ignoring OpenDML index of stream {}: {}", stream, e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if let Some(idx1) = idx1 {
            let entries = parse_idx1(idx1);
            let mode = self.resolve_offset_mode(&entries)?;
            let records = self.records_from_idx1(&entries, mode);
            table.offset_mode = Some(mode);

            for (stream, stream_records) in records.into_iter().enumerate() {
                if table.sources[stream] == IndexSource::None {
                    table.streams[stream] = stream_records;
                    table.sources[stream] = IndexSource::Idx1;
                }
            }
        } else if table.sources.contains(&IndexSource::None) {
            let has_any_index = table.sources.iter().any(|s| *s != IndexSource::None);
            if must_use_index && !has_any_index && self.config.honor_must_use_index {
                return Err(AviError::MissingIndex);
            }

            if self.config.scan_without_index {
                log::debug!("No idx1 chunk, scanning movi");
                let scanned = self.scan_movi()?;
                for (stream, stream_records) in scanned.into_iter().enumerate() {
                    if table.sources[stream] == IndexSource::None {
                        table.streams[stream] = stream_records;
                        table.sources[stream] = IndexSource::Scan;
                    }
                }
            } else {
                log::warn!("File has no index and movi scanning is disabled");
            }
        }

        log::debug!(
            "Index built: {} records over {} streams",
            table.total_records(),
            table.stream_count()
        );
        Ok(table)
    }

    /// Pick the idx1 offset convention by checking where the first entry lands
    fn resolve_offset_mode(&mut self, entries: &[IndexEntry]) -> Result<OffsetMode> {
        if self.config.offset_mode != OffsetMode::Auto {
            return Ok(self.config.offset_mode);
        }

        let Some(probe) = entries.iter().find(|e| !e.is_list()) else {
            return Ok(OffsetMode::MoviRelative);
        };

        if peek_fourcc(self.src, probe.offset as u64)? == Some(probe.chunk_id) {
            log::debug!("idx1 offsets are absolute");
            return Ok(OffsetMode::Absolute);
        }

        let base = self.movi.first().map_or(0, |m| m.base);
        if peek_fourcc(self.src, base + probe.offset as u64)? == Some(probe.chunk_id) {
            log::debug!("idx1 offsets are relative to movi at {}", base);
            return Ok(OffsetMode::MoviRelative);
        }

        log::warn!(
            "idx1 entry '{}' at {} matches no chunk, assuming movi-relative offsets",
            probe.chunk_id,
            probe.offset
        );
        Ok(OffsetMode::MoviRelative)
    }

    fn records_from_idx1(&self, entries: &[IndexEntry], mode: OffsetMode) -> Vec<Vec<IndexRecord>> {
        let base = self.movi.first().map_or(0, |m| m.base);
        let mut streams = vec![Vec::new(); self.stream_count];
        let mut unknown_stream = 0usize;
        let mut outside_movi = 0usize;

        for entry in entries.iter().filter(|e| !e.is_list()) {
            let id = ChunkId::parse(entry.chunk_id);
            let Some(stream) = id.data_stream() else { continue };
            if stream >= self.stream_count {
                unknown_stream += 1;
                continue;
            }

            let header = match mode {
                OffsetMode::Absolute => entry.offset as u64,
                _ => base + entry.offset as u64,
            };
            let record = IndexRecord {
                stream,
                offset: header + CHUNK_HEADER_SIZE,
                size: entry.size,
                keyframe: entry.is_keyframe(),
                chunk_type: id.chunk_type,
            };
            if !self.in_movi(header, &record) {
                outside_movi += 1;
                continue;
            }
            streams[stream].push(record);
        }

        if unknown_stream > 0 {
            log::warn!("Dropped {} idx1 entries for undeclared streams", unknown_stream);
        }
        if outside_movi > 0 {
            log::warn!("Dropped {} idx1 entries outside the movi list", outside_movi);
        }
        streams
    }

    fn in_movi(&self, header: u64, record: &IndexRecord) -> bool {
        let end = record.offset.saturating_add(record.size as u64);
        self.movi
            .iter()
            .any(|m| header >= m.children.start && end <= m.children.end)
    }

    /// Records of one stream from its `indx` chunk
    fn read_odml(&mut self, stream: usize, indx: &[u8]) -> Result<Vec<IndexRecord>> {
        let header = OdmlIndexHeader::read(indx, 0)?;

        match header.index_type {
            AVI_INDEX_OF_CHUNKS => self.standard_index_records(stream, indx, 0),
            AVI_INDEX_OF_INDEXES => {
                let mut records = Vec::new();
                for entry in header.entries(indx, 16) {
                    let offset = LittleEndian::read_u64(&entry[..8]);
                    if offset.saturating_add(CHUNK_HEADER_SIZE) > self.file_len {
                        log::warn!(
                            "Standard index of stream {} at {} is past the end of file",
                            stream,
                            offset
                        );
                        continue;
                    }

                    let mut cursor = ChunkCursor::new(offset..self.file_len);
                    let Some(chunk) = cursor.next_chunk_clamped(self.src)? else { continue };
                    let data = chunk.read_payload(self.src)?;
                    records.extend(self.standard_index_records(stream, &data, chunk.offset)?);
                }
                Ok(records)
            }
            other => Err(AviError::malformed(0, format!("unknown OpenDML index type {}", other))),
        }
    }

    fn standard_index_records(
        &self,
        stream: usize,
        data: &[u8],
        offset: u64,
    ) -> Result<Vec<IndexRecord>> {
        let header = OdmlIndexHeader::read(data, offset)?;
        if header.index_type != AVI_INDEX_OF_CHUNKS {
            return Err(AviError::malformed(
                offset,
                format!("expected a standard index, found type {}", header.index_type),
            ));
        }
        let chunk_type = ChunkId::parse(header.chunk_id).chunk_type;

        let mut records = Vec::new();
        let mut outside_movi = 0usize;
        for entry in header.entries(data, 8) {
            let relative = LittleEndian::read_u32(&entry[..4]);
            let size = LittleEndian::read_u32(&entry[4..8]);
            let record = IndexRecord {
                stream,
                offset: header.base_offset.saturating_add(relative as u64),
                size: size & !NON_KEYFRAME,
                keyframe: size & NON_KEYFRAME == 0,
                chunk_type,
            };
            if record.offset < CHUNK_HEADER_SIZE
                || !self.in_movi(record.offset - CHUNK_HEADER_SIZE, &record)
            {
                outside_movi += 1;
                continue;
            }
            records.push(record);
        }

        if outside_movi > 0 {
            log::warn!(
                "Dropped {} OpenDML entries of stream {} outside the movi lists",
                outside_movi,
                stream
            );
        }
        Ok(records)
    }

    /// Walk every `movi` list, descending into `rec ` lists
    fn scan_movi(&mut self) -> Result<Vec<Vec<IndexRecord>>> {
        let mut streams = vec![Vec::new(); self.stream_count];

        for movi in self.movi {
            let mut stack = vec![ChunkCursor::new(movi.children.clone())];

            while let Some(cursor) = stack.last_mut() {
                let chunk = match cursor.next_chunk(self.src) {
                    Ok(Some(chunk)) => chunk,
                    Ok(None) => {
                        stack.pop();
                        continue;
                    }
                    Err(e @ AviError::MalformedContainer { .. }) => {
                        log::warn!("Stopping movi scan: {}", e);
                        stack.pop();
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                if chunk.id == chunk_ids::LIST {
                    match chunk.descend(self.src) {
                        Ok((kind, inner)) if kind == chunk_ids::REC => stack.push(inner),
                        Ok(_) => {}
                        Err(e @ AviError::MalformedContainer { .. }) => {
                            log::warn!("Skipping list in movi: {}", e);
                        }
                        Err(e) => return Err(e),
                    }
                    continue;
                }

                let id = ChunkId::parse(chunk.id);
                if let Some(stream) = id.data_stream().filter(|&s| s < self.stream_count) {
                    streams[stream].push(IndexRecord {
                        stream,
                        offset: chunk.payload_start(),
                        size: chunk.size,
                        keyframe: true,
                        chunk_type: id.chunk_type,
                    });
                }
            }
        }

        Ok(streams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(id);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn idx1_entry(id: &[u8; 4], flags: u32, offset: u32, size: u32) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out
    }

    /// Four bytes of padding, then `LIST movi` with two video chunks
    fn movi_fixture() -> (Vec<u8>, MoviList) {
        let mut movi = b"movi".to_vec();
        movi.extend(chunk(b"00dc", &[1, 2, 3, 4]));
        movi.extend(chunk(b"00dc", &[5, 6, 7]));

        let mut data = vec![0u8; 4];
        data.extend(chunk(b"LIST", &movi));
        let base = 4 + 8;
        let list = MoviList {
            base,
            children: base + 4..data.len() as u64,
        };
        (data, list)
    }

    #[test]
    fn test_index_entry() {
        let data = idx1_entry(b"00dc", IndexEntry::KEYFRAME, 1000, 5000);
        let entry = IndexEntry::read(&data).unwrap();
        assert_eq!(entry.chunk_id, FourCC(*b"00dc"));
        assert!(entry.is_keyframe());
        assert!(!entry.is_list());
        assert_eq!(entry.offset, 1000);
        assert_eq!(entry.size, 5000);
    }

    #[test]
    fn test_parse_idx1() {
        let mut data = idx1_entry(b"00dc", IndexEntry::KEYFRAME, 4, 1000);
        data.extend(idx1_entry(b"01wb", 0, 1012, 500));
        data.extend_from_slice(&[0; 5]);

        let entries = parse_idx1(&data);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_keyframe());
        assert!(!entries[1].is_keyframe());
    }

    #[test]
    fn test_movi_relative_offsets() {
        let (data, movi) = movi_fixture();
        let mut idx1 = idx1_entry(b"00dc", IndexEntry::KEYFRAME, 4, 4);
        idx1.extend(idx1_entry(b"00dc", 0, 16, 3));

        let mut src = Cursor::new(data.clone());
        let config = AviConfig::default();
        let movi = [movi];
        let table = IndexBuilder::new(&mut src, &movi, 1, data.len() as u64, &config)
            .build(Some(&idx1), &[None], false)
            .unwrap();

        assert_eq!(table.offset_mode(), Some(OffsetMode::MoviRelative));
        assert_eq!(table.source(0), Some(IndexSource::Idx1));
        let records = table.records(0).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].offset, 24);
        assert_eq!(records[0].size, 4);
        assert!(records[0].keyframe);
        assert_eq!(records[1].offset, 36);
        assert!(!records[1].keyframe);
    }

    #[test]
    fn test_absolute_offsets() {
        let (data, movi) = movi_fixture();
        let mut idx1 = idx1_entry(b"00dc", IndexEntry::KEYFRAME, 16, 4);
        idx1.extend(idx1_entry(b"00dc", IndexEntry::KEYFRAME, 28, 3));

        let mut src = Cursor::new(data.clone());
        let config = AviConfig::default();
        let movi = [movi];
        let table = IndexBuilder::new(&mut src, &movi, 1, data.len() as u64, &config)
            .build(Some(&idx1), &[None], false)
            .unwrap();

        assert_eq!(table.offset_mode(), Some(OffsetMode::Absolute));
        let records = table.records(0).unwrap();
        assert_eq!(records[0].offset, 24);
        assert_eq!(records[1].offset, 36);
    }

    #[test]
    fn test_idx1_filters() {
        let (data, movi) = movi_fixture();
        let mut idx1 = idx1_entry(b"rec ", IndexEntry::LIST, 4, 0);
        idx1.extend(idx1_entry(b"00dc", IndexEntry::KEYFRAME, 4, 4));
        idx1.extend(idx1_entry(b"00pc", 0, 4, 4));
        idx1.extend(idx1_entry(b"05dc", 0, 4, 4));
        idx1.extend(idx1_entry(b"00dc", 0, 4000, 4));

        let mut src = Cursor::new(data.clone());
        let config = AviConfig::default();
        let movi = [movi];
        let table = IndexBuilder::new(&mut src, &movi, 1, data.len() as u64, &config)
            .build(Some(&idx1), &[None], false)
            .unwrap();

        assert_eq!(table.records(0).unwrap().len(), 1);
        assert_eq!(table.total_records(), 1);
    }

    #[test]
    fn test_forced_offset_mode() {
        let (data, movi) = movi_fixture();
        let idx1 = idx1_entry(b"00dc", IndexEntry::KEYFRAME, 4, 4);

        let mut src = Cursor::new(data.clone());
        let config = AviConfig::new().with_offset_mode(OffsetMode::Absolute);
        let movi = [movi];
        let table = IndexBuilder::new(&mut src, &movi, 1, data.len() as u64, &config)
            .build(Some(&idx1), &[None], false)
            .unwrap();

        // absolute offset 4 is outside movi, so the record is dropped
        assert_eq!(table.offset_mode(), Some(OffsetMode::Absolute));
        assert!(table.records(0).unwrap().is_empty());
    }

    #[test]
    fn test_scan_without_index() {
        let (data, movi) = movi_fixture();
        let mut src = Cursor::new(data.clone());
        let config = AviConfig::default();
        let movi = [movi];
        let table = IndexBuilder::new(&mut src, &movi, 1, data.len() as u64, &config)
            .build(None, &[None], false)
            .unwrap();

        assert_eq!(table.source(0), Some(IndexSource::Scan));
        assert_eq!(table.offset_mode(), None);
        let records = table.records(0).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.keyframe));
        assert_eq!(records[1].size, 3);
    }

    #[test]
    fn test_scan_skips_malformed_list() {
        let mut movi = b"movi".to_vec();
        movi.extend(chunk(b"LIST", b"ab"));
        movi.extend(chunk(b"00dc", &[1, 2, 3, 4]));

        let mut data = vec![0u8; 4];
        data.extend(chunk(b"LIST", &movi));
        let movi = [MoviList {
            base: 12,
            children: 16..data.len() as u64,
        }];

        let mut src = Cursor::new(data.clone());
        let config = AviConfig::default();
        let table = IndexBuilder::new(&mut src, &movi, 1, data.len() as u64, &config)
            .build(None, &[None], false)
            .unwrap();
        let records = table.records(0).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].offset, 34);
    }

    #[test]
    fn test_must_use_index() {
        let (data, movi) = movi_fixture();
        let movi = [movi];

        let mut src = Cursor::new(data.clone());
        let config = AviConfig::default();
        let result = IndexBuilder::new(&mut src, &movi, 1, data.len() as u64, &config)
            .build(None, &[None], true);
        assert!(matches!(result, Err(AviError::MissingIndex)));

        let config = AviConfig::new().with_honor_must_use_index(false);
        let table = IndexBuilder::new(&mut src, &movi, 1, data.len() as u64, &config)
            .build(None, &[None], true)
            .unwrap();
        assert_eq!(table.records(0).unwrap().len(), 2);
    }

    #[test]
    fn test_scan_disabled() {
        let (data, movi) = movi_fixture();
        let mut src = Cursor::new(data.clone());
        let config = AviConfig::new().with_scan_without_index(false);
        let movi = [movi];
        let table = IndexBuilder::new(&mut src, &movi, 1, data.len() as u64, &config)
            .build(None, &[None], false)
            .unwrap();
        assert_eq!(table.source(0), Some(IndexSource::None));
        assert!(table.records(0).unwrap().is_empty());
    }

    #[test]
    fn test_standard_index_in_strl() {
        let (data, movi) = movi_fixture();

        // index of chunks stored directly in indx, base at the movi tag
        let mut indx = Vec::new();
        indx.extend_from_slice(&2u16.to_le_bytes());
        indx.push(0);
        indx.push(AVI_INDEX_OF_CHUNKS);
        indx.extend_from_slice(&2u32.to_le_bytes());
        indx.extend_from_slice(b"00dc");
        indx.extend_from_slice(&movi.base.to_le_bytes());
        indx.extend_from_slice(&0u32.to_le_bytes());
        indx.extend_from_slice(&12u32.to_le_bytes());
        indx.extend_from_slice(&4u32.to_le_bytes());
        indx.extend_from_slice(&24u32.to_le_bytes());
        indx.extend_from_slice(&(3u32 | NON_KEYFRAME).to_le_bytes());

        let mut src = Cursor::new(data.clone());
        let config = AviConfig::default();
        let movi = [movi];
        let table = IndexBuilder::new(&mut src, &movi, 1, data.len() as u64, &config)
            .build(None, &[Some(indx)], false)
            .unwrap();

        assert_eq!(table.source(0), Some(IndexSource::OpenDml));
        let records = table.records(0).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].offset, 24);
        assert!(records[0].keyframe);
        assert_eq!(records[1].offset, 36);
        assert_eq!(records[1].size, 3);
        assert!(!records[1].keyframe);
    }

    #[test]
    fn test_bad_odml_index_falls_back() {
        let (data, movi) = movi_fixture();
        let mut src = Cursor::new(data.clone());
        let config = AviConfig::default();
        let movi = [movi];
        let table = IndexBuilder::new(&mut src, &movi, 1, data.len() as u64, &config)
            .build(None, &[Some(vec![0; 10])], false)
            .unwrap();
        assert_eq!(table.source(0), Some(IndexSource::Scan));
    }
}
