//! Palette file loading. Formats are detected by their magic bytes:
//! Microsoft RIFF PAL, JASC, GIMP, Paint.NET, PNG, and (fallback) ACT.

use std::fs;
use std::path::Path;

use crate::bitmap::{self, rgba};
use crate::error::{CrunchError, Result};

const MSPAL_MAGIC: &[u8] = b"RIFF";
const JASC_MAGIC: &[u8] = b"JASC-PAL";
const GIMP_MAGIC: &[u8] = b"GIMP Palette";
const PAINT_NET_MAGIC: &[u8] = b";";
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Colors as RGBA words (R in the low byte), plus the transparent entry
/// when the format records one (ACT footer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPalette {
    pub colors: Vec<u32>,
    pub transparent_index: i32,
}

pub fn read_palette(path: &Path) -> Result<LoadedPalette> {
    let bytes = fs::read(path).map_err(|_| palette_error(path))?;
    if bytes.starts_with(MSPAL_MAGIC) {
        read_mspal(&bytes, path)
    } else if bytes.starts_with(JASC_MAGIC) {
        read_jasc(&bytes, path)
    } else if bytes.starts_with(GIMP_MAGIC) {
        read_gimp(&bytes)
    } else if bytes.starts_with(PNG_MAGIC) {
        read_png(&bytes, path)
    } else if bytes.starts_with(PAINT_NET_MAGIC) {
        read_paint_net(&bytes)
    } else {
        read_act(&bytes, path)
    }
}

fn palette_error(path: &Path) -> CrunchError {
    CrunchError::Palette {
        path: path.to_path_buf(),
    }
}

/// Adobe color table: 256 RGB triplets, optionally followed by a
/// big-endian count and transparent index.
fn read_act(bytes: &[u8], path: &Path) -> Result<LoadedPalette> {
    if bytes.len() < 768 {
        return Err(palette_error(path));
    }
    let mut colors: Vec<u32> = bytes[..768]
        .chunks_exact(3)
        .map(|c| rgba(c[0], c[1], c[2], 255))
        .collect();
    let mut transparent_index = 0;
    if bytes.len() == 772 {
        let count = u16::from_be_bytes([bytes[768], bytes[769]]) as usize;
        transparent_index = i32::from(i16::from_be_bytes([bytes[770], bytes[771]]));
        colors.truncate(count.min(256));
    }
    Ok(LoadedPalette {
        colors,
        transparent_index,
    })
}

/// RIFF PAL: "RIFF" len "PAL " "data" size version count, then one
/// 4-byte entry per color (the fourth byte is taken as alpha).
fn read_mspal(bytes: &[u8], path: &Path) -> Result<LoadedPalette> {
    if bytes.len() < 24 || &bytes[8..12] != b"PAL " || &bytes[12..16] != b"data" {
        return Err(palette_error(path));
    }
    let count = u16::from_le_bytes([bytes[22], bytes[23]]) as usize;
    let mut colors = Vec::with_capacity(count);
    for i in 0..count {
        let offset = 24 + i * 4;
        let entry = bytes.get(offset..offset + 4).ok_or_else(|| palette_error(path))?;
        colors.push(rgba(entry[0], entry[1], entry[2], entry[3]));
    }
    Ok(LoadedPalette {
        colors,
        transparent_index: 0,
    })
}

/// JASC-PAL text: magic line, version line, count line, then one
/// "R G B" line per color.
fn read_jasc(bytes: &[u8], path: &Path) -> Result<LoadedPalette> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = text.lines();
    lines.next();
    lines.next();
    let count: usize = lines
        .next()
        .and_then(|l| l.trim().parse().ok())
        .ok_or_else(|| palette_error(path))?;
    let mut colors = Vec::with_capacity(count);
    for line in lines.take(count) {
        let mut channels = line.split_whitespace().map(|t| t.parse::<u8>());
        match (channels.next(), channels.next(), channels.next()) {
            (Some(Ok(r)), Some(Ok(g)), Some(Ok(b))) => colors.push(rgba(r, g, b, 255)),
            _ => return Err(palette_error(path)),
        }
    }
    Ok(LoadedPalette {
        colors,
        transparent_index: 0,
    })
}

/// GIMP palette text: header lines (`Name:`, `Columns:`, `#`) are
/// skipped; remaining lines start with three color components.
fn read_gimp(bytes: &[u8]) -> Result<LoadedPalette> {
    let text = String::from_utf8_lossy(bytes);
    let mut colors = Vec::new();
    for line in text.lines().skip(1) {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with("Name:")
            || line.starts_with("Columns:")
            || line.starts_with('#')
        {
            continue;
        }
        let mut channels = line.split_whitespace().map(|t| t.parse::<u8>());
        if let (Some(Ok(r)), Some(Ok(g)), Some(Ok(b))) =
            (channels.next(), channels.next(), channels.next())
        {
            colors.push(rgba(r, g, b, 255));
        }
    }
    Ok(LoadedPalette {
        colors,
        transparent_index: 0,
    })
}

/// Paint.NET palette text: `;` comment lines, then one AARRGGBB hex
/// value per line (the alpha byte is ignored).
fn read_paint_net(bytes: &[u8]) -> Result<LoadedPalette> {
    let text = String::from_utf8_lossy(bytes);
    let mut colors = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Ok(value) = u32::from_str_radix(line, 16) {
            colors.push(rgba(
                (value >> 16 & 0xff) as u8,
                (value >> 8 & 0xff) as u8,
                (value & 0xff) as u8,
                255,
            ));
        }
    }
    Ok(LoadedPalette {
        colors,
        transparent_index: 0,
    })
}

/// Indexed PNG: the palette table is taken as-is, tRNS alpha applied.
fn read_png(bytes: &[u8], path: &Path) -> Result<LoadedPalette> {
    let reader = png::Decoder::new(bytes)
        .read_info()
        .map_err(|_| palette_error(path))?;
    let info = reader.info();
    if info.color_type != png::ColorType::Indexed {
        return Err(palette_error(path));
    }
    Ok(LoadedPalette {
        colors: bitmap::indexed_palette(info),
        transparent_index: 0,
    })
}
