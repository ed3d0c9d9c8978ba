//! Reader configuration.

/// How `idx1` offsets are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetMode {
    /// Probe the first index entry and pick whichever convention lands on
    /// a matching chunk header.
    #[default]
    Auto,
    /// Offsets are file positions of the chunk headers.
    Absolute,
    /// Offsets are relative to the `movi` list type tag.
    MoviRelative,
}

/// Options for [`AviFile::open_with`](crate::AviFile::open_with).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AviConfig {
    /// `idx1` offset convention.
    pub offset_mode: OffsetMode,
    /// Use OpenDML `indx` indexes for streams that have one.
    pub prefer_odml_index: bool,
    /// Walk the `movi` lists when the file has no index.
    pub scan_without_index: bool,
    /// Refuse index-less files whose main header demands an index.
    pub honor_must_use_index: bool,
}

impl Default for AviConfig {
    fn default() -> Self {
        Self {
            offset_mode: OffsetMode::Auto,
            prefer_odml_index: true,
            scan_without_index: true,
            honor_must_use_index: true,
        }
    }
}

impl AviConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force an `idx1` offset convention.
    pub fn with_offset_mode(mut self, mode: OffsetMode) -> Self {
        self.offset_mode = mode;
        self
    }

    /// Choose between OpenDML indexes and `idx1`.
    pub fn with_odml_index(mut self, prefer: bool) -> Self {
        self.prefer_odml_index = prefer;
        self
    }

    /// Enable or disable the `movi` scan fallback.
    pub fn with_scan_without_index(mut self, scan: bool) -> Self {
        self.scan_without_index = scan;
        self
    }

    /// Enable or disable the `AVIF_MUSTUSEINDEX` check.
    pub fn with_honor_must_use_index(mut self, honor: bool) -> Self {
        self.honor_must_use_index = honor;
        self
    }
}
