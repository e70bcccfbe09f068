//! Decoded pixel buffers: PNG decode, premultiply, trim, content hashing,
//! and PNG encode for finished pages.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::warn;

use crate::error::{CrunchError, Result};
use crate::hash::AtlasHasher;

/// Packs channel bytes into an RGBA word with R in the low byte and A in
/// the high byte.
pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from(r) | u32::from(g) << 8 | u32::from(b) << 16 | u32::from(a) << 24
}

/// Pixel storage. A bitmap owns exactly one buffer: RGBA words, or 8-bit
/// indices into its palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pixels {
    Rgba(Vec<u32>),
    Indexed(Vec<u8>),
}

impl Pixels {
    pub fn is_indexed(&self) -> bool {
        matches!(self, Pixels::Indexed(_))
    }
}

/// Where a bitmap landed on its page. `dup_of` marks an alias of the
/// primary placement at that index in the page's bitmap list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub rotated: bool,
    pub dup_of: Option<usize>,
}

/// A decoded image region, possibly trimmed down from a larger frame.
#[derive(Debug, Clone)]
pub struct Bitmap {
    /// 0 for still images, 1-based for animation frames.
    pub frame_index: i32,
    /// Logical identifier, including any directory prefix.
    pub name: String,
    /// Animation tag covering this frame, if any.
    pub label: String,
    pub loop_direction: u8,
    /// Frame duration in milliseconds.
    pub duration: u32,
    /// Post-trim pixel dimensions.
    pub width: u32,
    pub height: u32,
    /// Offset of the trimmed rect inside the original frame; zero or
    /// negative (`-frame_x` pixels were removed from the left).
    pub frame_x: i32,
    pub frame_y: i32,
    /// Original (untrimmed) frame size.
    pub frame_w: u32,
    pub frame_h: u32,
    pub pixels: Pixels,
    /// RGBA words, up to 256 entries; empty iff `pixels` is RGBA.
    pub palette: Vec<u32>,
    /// 16-color row of the page palette this bitmap's indices address.
    pub palette_slot: u8,
    /// Content hash over (width, height, pixel bytes).
    pub hash_value: u64,
    /// Valid only after packing.
    pub pos: Option<Placement>,
}

impl Bitmap {
    /// Decodes a PNG from disk. Palette PNGs keep their indices and
    /// palette (sub-byte depths are expanded to 8-bit indices first);
    /// everything else becomes RGBA words.
    pub fn from_png(path: &Path, name: &str, premultiply: bool, trim: bool) -> Result<Bitmap> {
        let file = File::open(path)?;
        let mut reader = png::Decoder::new(BufReader::new(file)).read_info()?;
        if reader.info().color_type == png::ColorType::Indexed {
            let palette = indexed_palette(reader.info());
            let mut buf = vec![0u8; reader.output_buffer_size()];
            let frame = reader.next_frame(&mut buf)?;
            let indices =
                expand_indices(&buf, frame.width, frame.height, frame.bit_depth, frame.line_size)?;
            Ok(Self::from_pixels(
                name.to_string(),
                frame.width,
                frame.height,
                Pixels::Indexed(indices),
                palette,
                false,
                trim,
            ))
        } else {
            drop(reader);
            let rgba_image = image::open(path)?.to_rgba8();
            let (width, height) = rgba_image.dimensions();
            let words = rgba_image
                .pixels()
                .map(|p| u32::from_le_bytes(p.0))
                .collect();
            Ok(Self::from_pixels(
                name.to_string(),
                width,
                height,
                Pixels::Rgba(words),
                Vec::new(),
                premultiply,
                trim,
            ))
        }
    }

    /// Builds a bitmap from an already-decoded buffer, applying
    /// premultiplication and trim, then hashing the result.
    pub fn from_pixels(
        name: String,
        width: u32,
        height: u32,
        mut pixels: Pixels,
        palette: Vec<u32>,
        premultiply: bool,
        trim: bool,
    ) -> Bitmap {
        if premultiply {
            if let Pixels::Rgba(words) = &mut pixels {
                premultiply_alpha(words);
            }
        }
        let (trim_w, trim_h, frame_x, frame_y, pixels) = if trim {
            trim_pixels(pixels, width, height, &name)
        } else {
            (width, height, 0, 0, pixels)
        };
        let hash_value = content_hash(trim_w, trim_h, &pixels);
        Bitmap {
            frame_index: 0,
            name,
            label: String::new(),
            loop_direction: 0,
            duration: 0,
            width: trim_w,
            height: trim_h,
            frame_x,
            frame_y,
            frame_w: width,
            frame_h: height,
            pixels,
            palette,
            palette_slot: 0,
            hash_value,
            pos: None,
        }
    }

    /// Blank canvas for page rendering; indexed when a palette is given.
    pub fn canvas(width: u32, height: u32, palette: &[u32]) -> Bitmap {
        let count = (width * height) as usize;
        let pixels = if palette.is_empty() {
            Pixels::Rgba(vec![0; count])
        } else {
            Pixels::Indexed(vec![0; count])
        };
        Bitmap {
            frame_index: 0,
            name: String::new(),
            label: String::new(),
            loop_direction: 0,
            duration: 0,
            width,
            height,
            frame_x: 0,
            frame_y: 0,
            frame_w: width,
            frame_h: height,
            pixels,
            palette: palette.to_vec(),
            palette_slot: 0,
            hash_value: 0,
            pos: None,
        }
    }

    /// Byte-for-byte pixel equality; guards the dedup map against hash
    /// collisions.
    pub fn same_pixels(&self, other: &Bitmap) -> bool {
        self.width == other.width && self.height == other.height && self.pixels == other.pixels
    }

    /// Encodes the bitmap as a PNG. Indexed bitmaps write an 8-bit
    /// palette image with opaque palette entries; RGBA bitmaps write
    /// RGBA8.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), self.width, self.height);
        encoder.set_depth(png::BitDepth::Eight);
        match &self.pixels {
            Pixels::Indexed(indices) => {
                encoder.set_color(png::ColorType::Indexed);
                let mut rgb = Vec::with_capacity(self.palette.len() * 3);
                for &entry in &self.palette {
                    rgb.push((entry & 0xff) as u8);
                    rgb.push((entry >> 8 & 0xff) as u8);
                    rgb.push((entry >> 16 & 0xff) as u8);
                }
                encoder.set_palette(rgb);
                let mut writer = encoder.write_header()?;
                writer.write_image_data(indices)?;
                writer.finish()?;
            }
            Pixels::Rgba(words) => {
                encoder.set_color(png::ColorType::Rgba);
                let mut bytes = Vec::with_capacity(words.len() * 4);
                for &word in words {
                    bytes.extend_from_slice(&word.to_le_bytes());
                }
                let mut writer = encoder.write_header()?;
                writer.write_image_data(&bytes)?;
                writer.finish()?;
            }
        }
        Ok(())
    }
}

/// Palette entries from a decoded indexed PNG, with tRNS alpha applied.
pub(crate) fn indexed_palette(info: &png::Info) -> Vec<u32> {
    let rgb = info.palette.as_deref().unwrap_or_default();
    let trns = info.trns.as_deref().unwrap_or_default();
    rgb.chunks_exact(3)
        .enumerate()
        .map(|(i, c)| rgba(c[0], c[1], c[2], trns.get(i).copied().unwrap_or(255)))
        .collect()
}

/// Unpacks 1/2/4-bit palette indices (MSB first within each byte) into
/// one byte per pixel. 8-bit rows pass through.
fn expand_indices(
    buf: &[u8],
    width: u32,
    height: u32,
    depth: png::BitDepth,
    line_size: usize,
) -> Result<Vec<u8>> {
    let (w, h) = (width as usize, height as usize);
    let bits = match depth {
        png::BitDepth::Eight => return Ok(buf[..w * h].to_vec()),
        png::BitDepth::One => 1,
        png::BitDepth::Two => 2,
        png::BitDepth::Four => 4,
        png::BitDepth::Sixteen => {
            return Err(CrunchError::InvalidInput(
                "16-bit palette indices are not a valid png".into(),
            ))
        }
    };
    let mask = (1u16 << bits) - 1;
    let per_byte = 8 / bits;
    let mut out = Vec::with_capacity(w * h);
    for row in 0..h {
        let line = &buf[row * line_size..(row + 1) * line_size];
        for x in 0..w {
            let byte = line[x / per_byte];
            let shift = 8 - bits * (x % per_byte + 1);
            out.push(((u16::from(byte) >> shift) & mask) as u8);
        }
    }
    Ok(out)
}

/// Premultiplies each RGBA word by its alpha, flooring.
fn premultiply_alpha(words: &mut [u32]) {
    for px in words.iter_mut() {
        let c = *px;
        let a = c >> 24;
        let r = (c & 0xff) * a / 255;
        let g = (c >> 8 & 0xff) * a / 255;
        let b = (c >> 16 & 0xff) * a / 255;
        *px = a << 24 | b << 16 | g << 8 | r;
    }
}

/// Finds the tightest rectangle containing every non-transparent pixel
/// (alpha > 0 for RGBA, index != 0 for indexed) and copies it into a
/// fresh buffer. A fully transparent image keeps its original bounds.
fn trim_pixels(pixels: Pixels, w: u32, h: u32, name: &str) -> (u32, u32, i32, i32, Pixels) {
    let solid = |x: u32, y: u32| {
        let i = (y * w + x) as usize;
        match &pixels {
            Pixels::Rgba(p) => p[i] >> 24 != 0,
            Pixels::Indexed(p) => p[i] != 0,
        }
    };

    let mut min_x = w;
    let mut min_y = h;
    let mut max_x = 0;
    let mut max_y = 0;
    for y in 0..h {
        for x in 0..w {
            if solid(x, y) {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }
    if min_x > max_x || min_y > max_y {
        warn!(name, "image is completely transparent!");
        return (w, h, 0, 0, pixels);
    }

    let trim_w = max_x - min_x + 1;
    let trim_h = max_y - min_y + 1;
    if trim_w == w && trim_h == h {
        return (w, h, 0, 0, pixels);
    }

    let copy_rows = |src_stride: usize, dst: &mut dyn FnMut(usize, usize)| {
        for y in 0..trim_h as usize {
            for x in 0..trim_w as usize {
                let src = (min_y as usize + y) * src_stride + min_x as usize + x;
                dst(y * trim_w as usize + x, src);
            }
        }
    };
    let trimmed = match &pixels {
        Pixels::Rgba(p) => {
            let mut out = vec![0u32; (trim_w * trim_h) as usize];
            copy_rows(w as usize, &mut |dst, src| out[dst] = p[src]);
            Pixels::Rgba(out)
        }
        Pixels::Indexed(p) => {
            let mut out = vec![0u8; (trim_w * trim_h) as usize];
            copy_rows(w as usize, &mut |dst, src| out[dst] = p[src]);
            Pixels::Indexed(out)
        }
    };
    (
        trim_w,
        trim_h,
        -(min_x as i32),
        -(min_y as i32),
        trimmed,
    )
}

/// Digest over (width, height, pixel bytes); indexed and RGBA buffers
/// hash the same way at the byte level.
fn content_hash(width: u32, height: u32, pixels: &Pixels) -> u64 {
    let mut hasher = AtlasHasher::new();
    hasher.combine(u64::from(width));
    hasher.combine(u64::from(height));
    match pixels {
        Pixels::Indexed(p) => hasher.write_bytes(p),
        Pixels::Rgba(p) => {
            for &word in p {
                hasher.write_bytes(&word.to_le_bytes());
            }
        }
    }
    hasher.finish()
}
