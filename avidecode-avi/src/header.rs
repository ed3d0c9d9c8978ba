//! Header list (`hdrl`) parsing

use crate::chunks::{chunk_ids, ChunkCursor, FourCC};
use crate::error::{AviError, Result};
use crate::types::{AudioFormat, AviFlags, AviHeader, Rect, StreamHeader, StreamType, VideoFormat};
use avidecode_dib::{BitmapFormat, Compression, FrameDecoder, Palette};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek};

/// Stream description
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    /// Stream index, in declaration order
    pub index: usize,
    /// Stream header
    pub header: StreamHeader,
    /// Video format (if video stream)
    pub video_format: Option<VideoFormat>,
    /// Audio format (if audio stream)
    pub audio_format: Option<AudioFormat>,
    /// Stream name (if available)
    pub name: Option<String>,
    /// Codec configuration from `strd` (if available)
    pub codec_data: Option<Vec<u8>>,
}

impl StreamDescriptor {
    /// Check if this is a video stream
    pub fn is_video(&self) -> bool {
        self.header.stream_type == StreamType::Video
    }

    /// Check if this is an audio stream
    pub fn is_audio(&self) -> bool {
        self.header.stream_type == StreamType::Audio
    }

    /// Media type
    pub fn stream_type(&self) -> StreamType {
        self.header.stream_type
    }

    /// Handler FourCC from the stream header
    pub fn handler(&self) -> FourCC {
        FourCC(self.header.handler)
    }

    /// Frame width, for video streams
    pub fn width(&self) -> Option<u32> {
        self.video_format.as_ref().map(|f| f.width.unsigned_abs())
    }

    /// Frame height, for video streams
    pub fn height(&self) -> Option<u32> {
        self.video_format.as_ref().map(VideoFormat::abs_height)
    }

    /// Bits per pixel (video) or per sample (audio)
    pub fn bit_depth(&self) -> Option<u16> {
        self.video_format
            .as_ref()
            .map(|f| f.bit_count)
            .or_else(|| self.audio_format.as_ref().map(|f| f.bits_per_sample))
    }

    /// Bitmap compression, for video streams
    pub fn compression(&self) -> Option<Compression> {
        self.video_format.as_ref().map(VideoFormat::compression)
    }

    /// Declared number of frames or samples
    pub fn sample_count(&self) -> u32 {
        self.header.length
    }

    /// Seconds per frame (scale / rate)
    pub fn frame_duration(&self) -> f64 {
        if self.header.rate > 0 {
            self.header.scale as f64 / self.header.rate as f64
        } else {
            0.0
        }
    }

    /// Get frame rate for video streams
    pub fn frame_rate(&self) -> f64 {
        if self.header.scale > 0 {
            self.header.rate as f64 / self.header.scale as f64
        } else {
            0.0
        }
    }

    /// Get duration in seconds
    pub fn duration(&self) -> f64 {
        self.header.length as f64 * self.frame_duration()
    }

    /// Bitmap format of a video stream
    pub fn bitmap_format(&self) -> Option<BitmapFormat> {
        if !self.is_video() {
            return None;
        }
        self.video_format.as_ref().map(VideoFormat::bitmap_format)
    }

    /// Whether frames of this stream can be decoded
    pub fn is_decodable(&self) -> bool {
        self.decoder().is_ok()
    }

    /// Frame decoder for this stream, or why there is none
    pub(crate) fn decoder(&self) -> std::result::Result<FrameDecoder, String> {
        if let Some(audio) = &self.audio_format {
            return Err(format!("{} audio streams are not decoded", audio.format_name()));
        }
        if !self.is_video() {
            return Err(format!(
                "'{}' streams are not decoded",
                FourCC(self.header.stream_type.to_fourcc())
            ));
        }
        let format = self
            .bitmap_format()
            .ok_or_else(|| "stream has no format chunk".to_string())?;
        FrameDecoder::new(format).map_err(|e| e.to_string())
    }
}

/// Result of parsing the header list
#[derive(Debug)]
pub(crate) struct Headers {
    pub header: AviHeader,
    pub streams: Vec<StreamDescriptor>,
    /// Raw `indx` payload per stream
    pub super_indexes: Vec<Option<Vec<u8>>>,
    /// Frame count from `dmlh`
    pub odml_total_frames: Option<u32>,
}

/// Walks `hdrl`: `avih`, then one `strl` list per stream
pub(crate) struct HeaderParser<'a, R> {
    src: &'a mut R,
    header: Option<AviHeader>,
    streams: Vec<StreamDescriptor>,
    super_indexes: Vec<Option<Vec<u8>>>,
    odml_total_frames: Option<u32>,
}

impl<'a, R: Read + Seek> HeaderParser<'a, R> {
    pub fn new(src: &'a mut R) -> Self {
        HeaderParser {
            src,
            header: None,
            streams: Vec::new(),
            super_indexes: Vec::new(),
            odml_total_frames: None,
        }
    }

    /// Parse the children of `hdrl`
    pub fn parse(mut self, mut cursor: ChunkCursor) -> Result<Headers> {
        while let Some(chunk) = cursor.next_chunk(self.src)? {
            match chunk.id {
                id if id == chunk_ids::AVIH => {
                    let data = chunk.read_payload(self.src)?;
                    self.header = Some(parse_avih(&data, chunk.offset)?);
                }
                id if id == chunk_ids::LIST => {
                    let (kind, inner) = chunk.descend(self.src)?;
                    match kind {
                        k if k == chunk_ids::STRL => self.parse_strl(inner)?,
                        k if k == chunk_ids::ODML => self.parse_odml(inner)?,
                        _ => log::debug!("Skipping list in hdrl: {}", kind),
                    }
                }
                _ => log::debug!("Skipping chunk in hdrl: {}", chunk.id),
            }
        }

        let header = self.header.ok_or(AviError::MissingHeader("avih"))?;
        if header.streams as usize != self.streams.len() {
            log::warn!(
                "Main header declares {} streams, found {}",
                header.streams,
                self.streams.len()
            );
        }

        Ok(Headers {
            header,
            streams: self.streams,
            super_indexes: self.super_indexes,
            odml_total_frames: self.odml_total_frames,
        })
    }

    /// Parse strl (stream list)
    fn parse_strl(&mut self, mut cursor: ChunkCursor) -> Result<()> {
        let index = self.streams.len();
        let mut header = None;
        let mut format = None;
        let mut name = None;
        let mut codec_data = None;
        let mut super_index = None;

        while let Some(chunk) = cursor.next_chunk(self.src)? {
            match chunk.id {
                id if id == chunk_ids::STRH => {
                    let data = chunk.read_payload(self.src)?;
                    header = Some(parse_strh(&data, chunk.offset)?);
                }
                id if id == chunk_ids::STRF => {
                    format = Some((chunk.read_payload(self.src)?, chunk.offset));
                }
                id if id == chunk_ids::STRN => {
                    let data = chunk.read_payload(self.src)?;
                    name = Some(String::from_utf8_lossy(&data).trim_end_matches('\0').to_string());
                }
                id if id == chunk_ids::STRD => codec_data = Some(chunk.read_payload(self.src)?),
                id if id == chunk_ids::INDX => super_index = Some(chunk.read_payload(self.src)?),
                id if id == chunk_ids::JUNK => {}
                _ => log::debug!("Skipping chunk in strl: {}", chunk.id),
            }
        }

        let header = header.ok_or(AviError::MissingHeader("strh"))?;

        let (video_format, audio_format) = match (header.stream_type, format) {
            (StreamType::Video, Some((data, offset))) => {
                (Some(parse_video_format(&data, offset)?), None)
            }
            (StreamType::Audio, Some((data, offset))) => {
                (None, Some(parse_audio_format(&data, offset)?))
            }
            (_, None) => {
                log::warn!("Stream {} has no strf chunk", index);
                (None, None)
            }
            _ => (None, None),
        };

        let stream = StreamDescriptor {
            index,
            header,
            video_format,
            audio_format,
            name,
            codec_data,
        };
        log::debug!(
            "Added stream {}: {:?} '{}', {} frames at {:.3} fps",
            index,
            stream.stream_type(),
            stream.handler(),
            stream.sample_count(),
            stream.frame_rate()
        );

        self.streams.push(stream);
        self.super_indexes.push(super_index);
        Ok(())
    }

    /// Parse ODML extension
    fn parse_odml(&mut self, mut cursor: ChunkCursor) -> Result<()> {
        while let Some(chunk) = cursor.next_chunk(self.src)? {
            if chunk.id == chunk_ids::DMLH && chunk.size >= 4 {
                let data = chunk.read_payload(self.src)?;
                let total = LittleEndian::read_u32(&data[..4]);
                self.odml_total_frames = Some(total);
                log::debug!("ODML total frames: {}", total);
            }
        }
        Ok(())
    }
}

/// Parse avih (main AVI header)
pub(crate) fn parse_avih(data: &[u8], offset: u64) -> Result<AviHeader> {
    if data.len() < AviHeader::SIZE {
        return Err(AviError::malformed(
            offset,
            format!("avih holds {} of {} bytes", data.len(), AviHeader::SIZE),
        ));
    }

    let mut cursor = Cursor::new(data);

    let header = AviHeader {
        microseconds_per_frame: cursor.read_u32::<LittleEndian>()?,
        max_bytes_per_sec: cursor.read_u32::<LittleEndian>()?,
        padding_granularity: cursor.read_u32::<LittleEndian>()?,
        flags: AviFlags::from_u32(cursor.read_u32::<LittleEndian>()?),
        total_frames: cursor.read_u32::<LittleEndian>()?,
        initial_frames: cursor.read_u32::<LittleEndian>()?,
        streams: cursor.read_u32::<LittleEndian>()?,
        suggested_buffer_size: cursor.read_u32::<LittleEndian>()?,
        width: cursor.read_u32::<LittleEndian>()?,
        height: cursor.read_u32::<LittleEndian>()?,
    };

    log::debug!(
        "AVI header: {}x{}, {} frames, {:.2} fps",
        header.width,
        header.height,
        header.total_frames,
        header.frame_rate()
    );

    Ok(header)
}

/// Parse strh (stream header); 48, 56 and 64 byte layouts
pub(crate) fn parse_strh(data: &[u8], offset: u64) -> Result<StreamHeader> {
    if data.len() < StreamHeader::MIN_SIZE {
        return Err(AviError::malformed(
            offset,
            format!("strh holds {} of {} bytes", data.len(), StreamHeader::MIN_SIZE),
        ));
    }

    let mut cursor = Cursor::new(data);

    let mut type_bytes = [0u8; 4];
    cursor.read_exact(&mut type_bytes)?;

    let mut handler = [0u8; 4];
    cursor.read_exact(&mut handler)?;

    let mut header = StreamHeader {
        stream_type: StreamType::from_fourcc(&type_bytes),
        handler,
        flags: cursor.read_u32::<LittleEndian>()?,
        priority: cursor.read_u16::<LittleEndian>()?,
        language: cursor.read_u16::<LittleEndian>()?,
        initial_frames: cursor.read_u32::<LittleEndian>()?,
        scale: cursor.read_u32::<LittleEndian>()?,
        rate: cursor.read_u32::<LittleEndian>()?,
        start: cursor.read_u32::<LittleEndian>()?,
        length: cursor.read_u32::<LittleEndian>()?,
        suggested_buffer_size: cursor.read_u32::<LittleEndian>()?,
        quality: cursor.read_u32::<LittleEndian>()?,
        sample_size: cursor.read_u32::<LittleEndian>()?,
        frame: None,
    };

    header.frame = if data.len() >= 64 {
        Some(Rect {
            left: cursor.read_i32::<LittleEndian>()?,
            top: cursor.read_i32::<LittleEndian>()?,
            right: cursor.read_i32::<LittleEndian>()?,
            bottom: cursor.read_i32::<LittleEndian>()?,
        })
    } else if data.len() >= 56 {
        Some(Rect {
            left: cursor.read_i16::<LittleEndian>()? as i32,
            top: cursor.read_i16::<LittleEndian>()? as i32,
            right: cursor.read_i16::<LittleEndian>()? as i32,
            bottom: cursor.read_i16::<LittleEndian>()? as i32,
        })
    } else {
        None
    };

    Ok(header)
}

/// Parse video format (BITMAPINFOHEADER and colour table)
pub(crate) fn parse_video_format(data: &[u8], offset: u64) -> Result<VideoFormat> {
    if data.len() < VideoFormat::HEADER_SIZE {
        return Err(AviError::malformed(
            offset,
            format!("video strf holds {} of {} bytes", data.len(), VideoFormat::HEADER_SIZE),
        ));
    }

    let mut cursor = Cursor::new(data);

    let size = cursor.read_u32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?;
    let height = cursor.read_i32::<LittleEndian>()?;
    let planes = cursor.read_u16::<LittleEndian>()?;
    let bit_count = cursor.read_u16::<LittleEndian>()?;

    let mut compression = [0u8; 4];
    cursor.read_exact(&mut compression)?;

    let mut format = VideoFormat {
        size,
        width,
        height,
        planes,
        bit_count,
        compression,
        image_size: cursor.read_u32::<LittleEndian>()?,
        x_pels_per_meter: cursor.read_i32::<LittleEndian>()?,
        y_pels_per_meter: cursor.read_i32::<LittleEndian>()?,
        colors_used: cursor.read_u32::<LittleEndian>()?,
        colors_important: cursor.read_u32::<LittleEndian>()?,
        palette: Palette::default(),
        extra: Vec::new(),
    };

    // colour table follows the header, whose size may exceed 40 bytes
    let table_start = (size as usize).clamp(VideoFormat::HEADER_SIZE, data.len());
    let rest = &data[table_start..];
    let entries = format.palette_entries().min(rest.len() / 4);
    if entries < format.palette_entries() && !rest.is_empty() {
        log::warn!(
            "Colour table holds {} of {} entries",
            entries,
            format.palette_entries()
        );
    }
    format.palette = Palette::from_bgrx(rest, entries);
    format.extra = rest[entries * 4..].to_vec();

    Ok(format)
}

/// Parse audio format (WAVEFORMATEX)
pub(crate) fn parse_audio_format(data: &[u8], offset: u64) -> Result<AudioFormat> {
    if data.len() < AudioFormat::MIN_SIZE {
        return Err(AviError::malformed(
            offset,
            format!("audio strf holds {} of {} bytes", data.len(), AudioFormat::MIN_SIZE),
        ));
    }

    let mut cursor = Cursor::new(data);

    let format_tag = cursor.read_u16::<LittleEndian>()?;
    let channels = cursor.read_u16::<LittleEndian>()?;
    let samples_per_sec = cursor.read_u32::<LittleEndian>()?;
    let avg_bytes_per_sec = cursor.read_u32::<LittleEndian>()?;
    let block_align = cursor.read_u16::<LittleEndian>()?;
    let bits_per_sample = cursor.read_u16::<LittleEndian>()?;

    let extra_data = if data.len() >= 18 {
        let declared = cursor.read_u16::<LittleEndian>()? as usize;
        let available = data.len() - 18;
        data[18..18 + declared.min(available)].to_vec()
    } else {
        Vec::new()
    };

    Ok(AudioFormat {
        format_tag,
        channels,
        samples_per_sec,
        avg_bytes_per_sec,
        block_align,
        bits_per_sample,
        extra_data,
    })
}
