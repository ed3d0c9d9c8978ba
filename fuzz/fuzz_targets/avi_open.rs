#![no_main]

//! Fuzz target for AVI file parsing.
//!
//! Opens arbitrary bytes as an AVI file and decodes every frame it indexes.

use arbitrary::Arbitrary;
use avidecode_avi::{AviConfig, AviFile, OffsetMode};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

#[derive(Arbitrary, Debug)]
struct AviInput {
    data: Vec<u8>,
    offset_mode: OffsetChoice,
    prefer_odml_index: bool,
    scan_without_index: bool,
    /// Prepend a valid RIFF header so the walk gets past the signature check
    wrap_in_riff: bool,
}

#[derive(Arbitrary, Debug)]
enum OffsetChoice {
    Auto,
    Absolute,
    MoviRelative,
}

fuzz_target!(|input: AviInput| {
    if input.data.len() > 1024 * 1024 {
        return;
    }

    let data = if input.wrap_in_riff {
        let mut riff = b"RIFF".to_vec();
        riff.extend_from_slice(&(input.data.len() as u32 + 4).to_le_bytes());
        riff.extend_from_slice(b"AVI ");
        riff.extend_from_slice(&input.data);
        riff
    } else {
        input.data
    };

    let offset_mode = match input.offset_mode {
        OffsetChoice::Auto => OffsetMode::Auto,
        OffsetChoice::Absolute => OffsetMode::Absolute,
        OffsetChoice::MoviRelative => OffsetMode::MoviRelative,
    };
    let config = AviConfig::new()
        .with_offset_mode(offset_mode)
        .with_odml_index(input.prefer_odml_index)
        .with_scan_without_index(input.scan_without_index);

    let Ok(avi) = AviFile::open_with(Cursor::new(data), config) else {
        return;
    };

    for stream in 0..avi.stream_count() {
        let Ok(frames) = avi.frames(stream) else { continue };
        for frame in frames.take(64) {
            if let Err(e) = frame {
                assert!(!e.is_fatal() || matches!(e, avidecode_avi::AviError::Io(_)));
            }
        }
    }
});
