//! Page-canvas compositing: straight and rotated copies, plus 16-color
//! sub-palette detection for indexed pages.

use crate::bitmap::{Bitmap, Pixels};

/// Copies `src` into `dst` with its top-left at `(tx, ty)`. Indexed
/// sources only land on indexed canvases and RGBA on RGBA; mismatched
/// pairs leave the canvas untouched.
pub fn copy_pixels(dst: &mut Bitmap, src: &Bitmap, tx: u32, ty: u32) {
    let dw = dst.width as usize;
    let (sw, sh) = (src.width as usize, src.height as usize);
    match (&mut dst.pixels, &src.pixels) {
        (Pixels::Indexed(d), Pixels::Indexed(s)) => {
            blit(d, dw, s, sw, sh, tx as usize, ty as usize)
        }
        (Pixels::Rgba(d), Pixels::Rgba(s)) => blit(d, dw, s, sw, sh, tx as usize, ty as usize),
        _ => {}
    }
}

/// Copies `src` into `dst` rotated 90 degrees clockwise: the destination
/// spans `src.height` columns by `src.width` rows starting at `(tx, ty)`.
pub fn copy_pixels_rot(dst: &mut Bitmap, src: &Bitmap, tx: u32, ty: u32) {
    let dw = dst.width as usize;
    let (sw, sh) = (src.width as usize, src.height as usize);
    match (&mut dst.pixels, &src.pixels) {
        (Pixels::Indexed(d), Pixels::Indexed(s)) => {
            blit_rot(d, dw, s, sw, sh, tx as usize, ty as usize)
        }
        (Pixels::Rgba(d), Pixels::Rgba(s)) => blit_rot(d, dw, s, sw, sh, tx as usize, ty as usize),
        _ => {}
    }
}

/// Scans a 256-entry page palette for the 16-color row matching the
/// source's first 16 entries, comparing RGB only, and records the row on
/// the source. Sources with more than 16 used colors are still matched
/// only against their first 16 entries.
pub fn find_palette_slot(page: &Bitmap, src: &mut Bitmap) {
    if page.palette.len() != 256 || src.palette.len() < 16 {
        return;
    }
    for slot in 0..16 {
        let row = &page.palette[slot * 16..slot * 16 + 16];
        if row
            .iter()
            .zip(&src.palette[..16])
            .all(|(a, b)| a & 0x00ff_ffff == b & 0x00ff_ffff)
        {
            src.palette_slot = slot as u8;
            return;
        }
    }
}

fn blit<T: Copy>(dst: &mut [T], dw: usize, src: &[T], sw: usize, sh: usize, tx: usize, ty: usize) {
    for y in 0..sh {
        for x in 0..sw {
            dst[(ty + y) * dw + tx + x] = src[y * sw + x];
        }
    }
}

fn blit_rot<T: Copy>(
    dst: &mut [T],
    dw: usize,
    src: &[T],
    sw: usize,
    sh: usize,
    tx: usize,
    ty: usize,
) {
    let r = sh - 1;
    for y in 0..sw {
        for x in 0..sh {
            dst[(ty + y) * dw + tx + x] = src[(r - x) * sw + y];
        }
    }
}
