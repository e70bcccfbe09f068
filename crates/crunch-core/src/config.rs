use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{CrunchError, Result};

/// Manifest serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Xml,
    Bin,
    Json,
}

impl FromStr for OutputFormat {
    type Err = CrunchError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "bin" => Ok(Self::Bin),
            "json" => Ok(Self::Json),
            other => Err(CrunchError::Config(format!(
                "unknown output format: {other}"
            ))),
        }
    }
}

/// String encodings used by the binary manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinStringType {
    #[default]
    NullTerminated,
    Prefixed,
    SevenBitPrefixed,
    FixedLength,
}

impl BinStringType {
    /// Wire code stored in the manifest header.
    pub fn code(self) -> u8 {
        match self {
            Self::NullTerminated => 0,
            Self::Prefixed => 1,
            Self::SevenBitPrefixed => 2,
            Self::FixedLength => 3,
        }
    }
}

impl FromStr for BinStringType {
    type Err = CrunchError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "n" | "N" => Ok(Self::NullTerminated),
            "p" | "P" => Ok(Self::Prefixed),
            "7" => Ok(Self::SevenBitPrefixed),
            "f" | "F" => Ok(Self::FixedLength),
            other => Err(CrunchError::Config(format!(
                "invalid binary string type: {other}"
            ))),
        }
    }
}

/// Legal page bounds, smallest to largest.
pub const PAGE_SIZES: [u32; 7] = [64, 128, 256, 512, 1024, 2048, 4096];

/// Padding may range from 0 to this, inclusive.
pub const MAX_PADDING: u32 = 16;

pub fn parse_page_size(s: &str) -> Result<u32> {
    s.parse::<u32>()
        .ok()
        .filter(|v| PAGE_SIZES.contains(v))
        .ok_or_else(|| CrunchError::Config(format!("invalid size: {s}")))
}

pub fn parse_padding(s: &str) -> Result<u32> {
    s.parse::<u32>()
        .ok()
        .filter(|&v| v <= MAX_PADDING)
        .ok_or_else(|| CrunchError::Config(format!("invalid padding value: {s}")))
}

/// Build configuration shared by the whole pipeline.
#[derive(Debug, Clone)]
pub struct Options {
    pub output_format: OutputFormat,
    /// Opaque tag copied into the manifest; not interpreted.
    pub texture_format: i32,
    /// Premultiply RGBA pixels by their alpha channel during decode.
    pub alpha: bool,
    /// Strip fully transparent border rows/columns during decode.
    pub trim: bool,
    pub verbose: bool,
    /// Bypass the hash short-circuit and always rebuild.
    pub ignore: bool,
    /// Collapse pixel-identical bitmaps to a single packed region.
    pub unique: bool,
    /// Allow placing bitmaps rotated 90 degrees clockwise.
    pub rotate: bool,
    pub max_width: u32,
    pub max_height: u32,
    /// Padding added to the right and bottom of every placed rectangle.
    pub padding: u32,
    pub binstr: BinStringType,
    /// Hash inputs by (path, mtime) rather than by content bytes.
    pub last: bool,
    /// One atlas per first-level subdirectory, merged at the top.
    pub dirs: bool,
    /// Drop the `0` suffix when exactly one page is produced.
    pub nozero: bool,
    pub palette_file: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Xml,
            texture_format: 0,
            alpha: false,
            trim: false,
            verbose: false,
            ignore: false,
            unique: false,
            rotate: false,
            max_width: 4096,
            max_height: 4096,
            padding: 1,
            binstr: BinStringType::NullTerminated,
            last: false,
            dirs: false,
            nozero: false,
            palette_file: None,
        }
    }
}
