//! Input enumeration and decoding. Directories are walked depth-first in
//! name order so the load sequence is deterministic; PNG files become one
//! bitmap each and indexed Aseprite documents one bitmap per frame.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::bitmap::{rgba, Bitmap, Pixels};
use crate::config::Options;
use crate::error::{CrunchError, Result};

/// Loads every input path: files directly (no prefix), directories
/// recursively with `prefix` prepended to each bitmap name along with
/// the subpath inside the directory.
pub fn load_inputs(inputs: &[String], prefix: &str, options: &Options) -> Result<Vec<Bitmap>> {
    let mut bitmaps = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            load_tree(path, prefix, options, &mut bitmaps)?;
        } else {
            load_file(path, "", options, &mut bitmaps)?;
        }
    }
    Ok(bitmaps)
}

fn load_tree(root: &Path, prefix: &str, options: &Options, out: &mut Vec<Bitmap>) -> Result<()> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !matches!(
            extension_of(entry.path()).as_deref(),
            Some("png" | "ase" | "aseprite")
        ) {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let sub_prefix = match rel.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                format!("{prefix}{}/", parent.to_string_lossy().replace('\\', "/"))
            }
            _ => prefix.to_string(),
        };
        load_file(entry.path(), &sub_prefix, options, out)?;
    }
    Ok(())
}

fn load_file(path: &Path, prefix: &str, options: &Options, out: &mut Vec<Bitmap>) -> Result<()> {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let name = format!("{prefix}{stem}");
    match extension_of(path).as_deref() {
        Some("png") => {
            if options.verbose {
                debug!(path = %path.display(), "loading");
            }
            out.push(Bitmap::from_png(path, &name, options.alpha, options.trim)?);
        }
        Some("ase" | "aseprite") => {
            if options.verbose {
                debug!(path = %path.display(), "loading");
            }
            load_aseprite(path, &name, out)?;
        }
        _ => warn!(path = %path.display(), "unsupported file format"),
    }
    Ok(())
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Decodes an indexed Aseprite document into one bitmap per frame.
/// Frame pixels come back as RGBA and are resolved against the document
/// palette ((0,0,0,0) maps to the transparent entry); frame indices are
/// 1-based, and each frame carries the tag covering it.
fn load_aseprite(path: &Path, name: &str, out: &mut Vec<Bitmap>) -> Result<()> {
    let ase = asefile::AsepriteFile::read_file(path)?;
    let transparent = match ase.pixel_format() {
        asefile::PixelFormat::Indexed {
            transparent_color_index,
        } => transparent_color_index,
        _ => {
            return Err(CrunchError::InvalidInput(format!(
                "{}: aseprite document must be a paletted 8-bit image",
                path.display()
            )))
        }
    };
    let palette = ase.palette().ok_or_else(|| {
        CrunchError::InvalidInput(format!(
            "{}: aseprite document has no palette",
            path.display()
        ))
    })?;
    let colors: Vec<u32> = (0..palette.num_colors())
        .map(|i| match palette.color(i) {
            Some(c) => rgba(c.red(), c.green(), c.blue(), c.alpha()),
            None => 0,
        })
        .collect();

    for frame_index in 0..ase.num_frames() {
        let frame = ase.frame(frame_index);
        let image = frame.image();
        let (width, height) = image.dimensions();
        let mut indices = Vec::with_capacity((width * height) as usize);
        for pixel in image.pixels() {
            let [r, g, b, a] = pixel.0;
            let index = if r == 0 && g == 0 && b == 0 && a == 0 {
                transparent
            } else {
                let word = rgba(r, g, b, a);
                colors.iter().position(|&c| c == word).unwrap_or(0) as u8
            };
            indices.push(index);
        }
        let (label, loop_direction) = tag_for_frame(&ase, frame_index);
        let mut bitmap = Bitmap::from_pixels(
            name.to_string(),
            width,
            height,
            Pixels::Indexed(indices),
            colors.clone(),
            false,
            false,
        );
        bitmap.frame_index = frame_index as i32 + 1;
        bitmap.label = label;
        bitmap.loop_direction = loop_direction;
        bitmap.duration = frame.duration();
        out.push(bitmap);
    }
    Ok(())
}

fn tag_for_frame(ase: &asefile::AsepriteFile, frame: u32) -> (String, u8) {
    for i in 0..ase.num_tags() {
        let tag = ase.tag(i);
        if frame >= tag.from_frame() && frame <= tag.to_frame() {
            let direction = match tag.animation_direction() {
                asefile::AnimationDirection::Forward => 0,
                asefile::AnimationDirection::Reverse => 1,
                asefile::AnimationDirection::PingPong => 2,
            };
            return (tag.name().to_string(), direction);
        }
    }
    (String::new(), 0)
}
