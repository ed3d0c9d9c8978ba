//! In-memory AVI construction for integration tests.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};

pub const BI_RGB: u32 = 0;
pub const BI_RLE8: u32 = 1;

const AVIF_HASINDEX: u32 = 0x10;
const AVIF_MUSTUSEINDEX: u32 = 0x20;

/// Install the test logger once
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Serialize one chunk with its pad byte
pub fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    out.extend_from_slice(id);
    out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// Serialize a `LIST` of `kind`
pub fn list(kind: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = kind.to_vec();
    for child in children {
        payload.extend_from_slice(child);
    }
    chunk(b"LIST", &payload)
}

/// BITMAPINFOHEADER followed by a colour table
pub fn bitmap_info(
    width: i32,
    height: i32,
    bit_count: u16,
    compression: u32,
    palette: &[[u8; 4]],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(40).unwrap();
    out.write_i32::<LittleEndian>(width).unwrap();
    out.write_i32::<LittleEndian>(height).unwrap();
    out.write_u16::<LittleEndian>(1).unwrap();
    out.write_u16::<LittleEndian>(bit_count).unwrap();
    out.write_u32::<LittleEndian>(compression).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap(); // image size
    out.write_i32::<LittleEndian>(0).unwrap();
    out.write_i32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(palette.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    for entry in palette {
        out.extend_from_slice(entry);
    }
    out
}

/// 16-byte PCM WAVEFORMAT
pub fn wave_format(channels: u16, sample_rate: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u16::<LittleEndian>(1).unwrap();
    out.write_u16::<LittleEndian>(channels).unwrap();
    out.write_u32::<LittleEndian>(sample_rate).unwrap();
    out.write_u32::<LittleEndian>(sample_rate * channels as u32 * 2).unwrap();
    out.write_u16::<LittleEndian>(channels * 2).unwrap();
    out.write_u16::<LittleEndian>(16).unwrap();
    out
}

/// How the built file is indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStyle {
    /// idx1 offsets are file positions
    Absolute,
    /// idx1 offsets count from the `movi` tag
    MoviRelative,
    /// OpenDML `indx` super indexes pointing at `ix##` chunks
    OpenDml,
    /// No index at all
    None,
}

/// One stream of the file under construction
#[derive(Debug, Clone)]
pub struct TestStream {
    pub kind: [u8; 4],
    pub handler: [u8; 4],
    pub format: Option<Vec<u8>>,
    pub frames: Vec<(Vec<u8>, bool)>,
}

impl TestStream {
    pub fn video(handler: &[u8; 4], format: Vec<u8>, frames: Vec<Vec<u8>>) -> Self {
        TestStream {
            kind: *b"vids",
            handler: *handler,
            format: Some(format),
            frames: frames.into_iter().map(|f| (f, true)).collect(),
        }
    }

    pub fn audio(frames: Vec<Vec<u8>>) -> Self {
        TestStream {
            kind: *b"auds",
            handler: [0; 4],
            format: Some(wave_format(2, 44100)),
            frames: frames.into_iter().map(|f| (f, true)).collect(),
        }
    }

    /// Mark frame `n` as a delta frame
    pub fn with_delta(mut self, n: usize) -> Self {
        self.frames[n].1 = false;
        self
    }

    fn chunk_id(&self, stream: usize) -> [u8; 4] {
        let digits = format!("{:02}", stream);
        let suffix = if &self.kind == b"auds" { b"wb" } else { b"dc" };
        let d = digits.as_bytes();
        [d[0], d[1], suffix[0], suffix[1]]
    }
}

/// Assemble an AVI file from test streams
#[derive(Debug, Clone)]
pub struct AviBuilder {
    pub width: u32,
    pub height: u32,
    pub streams: Vec<TestStream>,
    pub index: IndexStyle,
    pub must_use_index: bool,
    /// Raw bytes placed at the start of `movi`, before any frame
    pub movi_prefix: Vec<u8>,
}

impl AviBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        AviBuilder {
            width,
            height,
            streams: Vec::new(),
            index: IndexStyle::MoviRelative,
            must_use_index: false,
            movi_prefix: Vec::new(),
        }
    }

    pub fn stream(mut self, stream: TestStream) -> Self {
        self.streams.push(stream);
        self
    }

    pub fn index(mut self, style: IndexStyle) -> Self {
        self.index = style;
        self
    }

    pub fn must_use_index(mut self) -> Self {
        self.must_use_index = true;
        self
    }

    pub fn movi_prefix(mut self, bytes: &[u8]) -> Self {
        self.movi_prefix = bytes.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let n = self.streams.len();

        // first pass fixes the hdrl size, second fills in ix## positions
        let placeholder = self.hdrl(&vec![(0, 0); n]);
        let movi_base = 12 + placeholder.len() as u64 + 8;

        let mut movi = b"movi".to_vec();
        movi.extend_from_slice(&self.movi_prefix);
        let mut placed: Vec<Vec<(u64, u32, bool)>> = vec![Vec::new(); n];
        let longest = self.streams.iter().map(|s| s.frames.len()).max().unwrap_or(0);
        for i in 0..longest {
            for (s, stream) in self.streams.iter().enumerate() {
                if let Some((data, keyframe)) = stream.frames.get(i) {
                    let header = movi_base + movi.len() as u64;
                    movi.extend(chunk(&stream.chunk_id(s), data));
                    placed[s].push((header, data.len() as u32, *keyframe));
                }
            }
        }

        let mut ix_chunks = vec![(0u64, 0u32); n];
        if self.index == IndexStyle::OpenDml {
            for (s, stream) in self.streams.iter().enumerate() {
                let digits = format!("{:02}", s);
                let d = digits.as_bytes();
                let id = [b'i', b'x', d[0], d[1]];
                let payload = standard_index(&stream.chunk_id(s), movi_base, &placed[s]);
                ix_chunks[s] = (movi_base + movi.len() as u64, payload.len() as u32 + 8);
                movi.extend(chunk(&id, &payload));
            }
        }

        let hdrl = self.hdrl(&ix_chunks);
        assert_eq!(hdrl.len(), placeholder.len());

        let mut body = b"AVI ".to_vec();
        body.extend(hdrl);
        body.extend(chunk(b"LIST", &movi));

        match self.index {
            IndexStyle::Absolute | IndexStyle::MoviRelative => {
                let mut idx1 = Vec::new();
                let longest = placed.iter().map(Vec::len).max().unwrap_or(0);
                for i in 0..longest {
                    for (s, stream) in self.streams.iter().enumerate() {
                        let Some(&(header, size, keyframe)) = placed[s].get(i) else { continue };
                        let offset = match self.index {
                            IndexStyle::Absolute => header,
                            _ => header - movi_base,
                        };
                        idx1.extend_from_slice(&stream.chunk_id(s));
                        idx1.write_u32::<LittleEndian>(if keyframe { 0x10 } else { 0 }).unwrap();
                        idx1.write_u32::<LittleEndian>(offset as u32).unwrap();
                        idx1.write_u32::<LittleEndian>(size).unwrap();
                    }
                }
                body.extend(chunk(b"idx1", &idx1));
            }
            IndexStyle::OpenDml | IndexStyle::None => {}
        }

        chunk(b"RIFF", &body)
    }

    fn hdrl(&self, ix_chunks: &[(u64, u32)]) -> Vec<u8> {
        let mut children = vec![chunk(b"avih", &self.avih())];

        for (s, stream) in self.streams.iter().enumerate() {
            let mut strl = vec![chunk(b"strh", &self.strh(stream))];
            if let Some(format) = &stream.format {
                strl.push(chunk(b"strf", format));
            }
            if self.index == IndexStyle::OpenDml {
                let (offset, size) = ix_chunks[s];
                strl.push(chunk(
                    b"indx",
                    &super_index(&stream.chunk_id(s), offset, size, stream.frames.len() as u32),
                ));
            }
            children.push(list(b"strl", &strl));
        }

        if self.index == IndexStyle::OpenDml {
            let total = self.streams.first().map_or(0, |s| s.frames.len() as u32);
            let mut dmlh = Vec::new();
            dmlh.write_u32::<LittleEndian>(total).unwrap();
            dmlh.extend_from_slice(&[0u8; 244]);
            children.push(list(b"odml", &[chunk(b"dmlh", &dmlh)]));
        }

        list(b"hdrl", &children)
    }

    fn avih(&self) -> Vec<u8> {
        let mut flags = 0;
        if matches!(self.index, IndexStyle::Absolute | IndexStyle::MoviRelative) {
            flags |= AVIF_HASINDEX;
        }
        if self.must_use_index {
            flags |= AVIF_MUSTUSEINDEX;
        }
        let frames = self.streams.first().map_or(0, |s| s.frames.len() as u32);

        let mut out = Vec::new();
        for value in [
            40_000,
            0,
            0,
            flags,
            frames,
            0,
            self.streams.len() as u32,
            0,
            self.width,
            self.height,
            0,
            0,
            0,
            0,
        ] {
            out.write_u32::<LittleEndian>(value).unwrap();
        }
        out
    }

    fn strh(&self, stream: &TestStream) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&stream.kind);
        out.extend_from_slice(&stream.handler);
        out.write_u32::<LittleEndian>(0).unwrap(); // flags
        out.write_u16::<LittleEndian>(0).unwrap(); // priority
        out.write_u16::<LittleEndian>(0).unwrap(); // language
        out.write_u32::<LittleEndian>(0).unwrap(); // initial frames
        out.write_u32::<LittleEndian>(1).unwrap(); // scale
        out.write_u32::<LittleEndian>(25).unwrap(); // rate
        out.write_u32::<LittleEndian>(0).unwrap(); // start
        out.write_u32::<LittleEndian>(stream.frames.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap(); // suggested buffer size
        out.write_u32::<LittleEndian>(u32::MAX).unwrap(); // quality
        out.write_u32::<LittleEndian>(0).unwrap(); // sample size
        for value in [0i16, 0, self.width as i16, self.height as i16] {
            out.write_i16::<LittleEndian>(value).unwrap();
        }
        out
    }
}

/// `indx` with a single entry pointing at an `ix##` chunk
fn super_index(chunk_id: &[u8; 4], offset: u64, size: u32, duration: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u16::<LittleEndian>(4).unwrap();
    out.write_u8(0).unwrap();
    out.write_u8(0).unwrap(); // index of indexes
    out.write_u32::<LittleEndian>(1).unwrap();
    out.extend_from_slice(chunk_id);
    out.extend_from_slice(&[0u8; 12]);
    out.write_u64::<LittleEndian>(offset).unwrap();
    out.write_u32::<LittleEndian>(size).unwrap();
    out.write_u32::<LittleEndian>(duration).unwrap();
    out
}

/// `ix##` payload for chunks whose headers sit at the given positions
fn standard_index(chunk_id: &[u8; 4], base: u64, placed: &[(u64, u32, bool)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u16::<LittleEndian>(2).unwrap();
    out.write_u8(0).unwrap();
    out.write_u8(1).unwrap(); // index of chunks
    out.write_u32::<LittleEndian>(placed.len() as u32).unwrap();
    out.extend_from_slice(chunk_id);
    out.write_u64::<LittleEndian>(base).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    for &(header, size, keyframe) in placed {
        out.write_u32::<LittleEndian>((header + 8 - base) as u32).unwrap();
        let flag = if keyframe { 0 } else { 0x8000_0000 };
        out.write_u32::<LittleEndian>(size | flag).unwrap();
    }
    out
}

/// RLE8 frame with a literal run wider than the image
pub const RLE8_LITERAL: [u8; 6] = [0x00, 0x04, 10, 20, 30, 40];

/// RLE8 frame filling a 2x2 image with 5, clipping the second run of each row
pub const RLE8_FILL: [u8; 12] = [
    0x02, 0x05, 0x02, 0x05, 0x00, 0x00, 0x02, 0x05, 0x02, 0x05, 0x00, 0x01,
];

/// Bottom-up, DWORD-aligned 2x2 8-bit frame: bottom row 1 2, top row 3 4
pub const RGB8_FRAME: [u8; 8] = [1, 2, 0, 0, 3, 4, 0, 0];

/// 2x2 8-bit file: stream 0 holds the uncompressed frame, stream 1 the two RLE8 frames
pub fn end_to_end(index: IndexStyle) -> Vec<u8> {
    end_to_end_builder(index).build()
}

pub fn end_to_end_builder(index: IndexStyle) -> AviBuilder {
    AviBuilder::new(2, 2)
        .stream(TestStream::video(
            b"DIB ",
            bitmap_info(2, 2, 8, BI_RGB, &[]),
            vec![RGB8_FRAME.to_vec()],
        ))
        .stream(TestStream::video(
            b"mrle",
            bitmap_info(2, 2, 8, BI_RLE8, &[]),
            vec![RLE8_LITERAL.to_vec(), RLE8_FILL.to_vec()],
        ))
        .index(index)
}
