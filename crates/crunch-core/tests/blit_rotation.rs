use crunch_core::bitmap::{rgba, Bitmap, Pixels};
use crunch_core::blit::{copy_pixels, copy_pixels_rot, find_palette_slot};

fn bitmap_rgba(w: u32, h: u32, pixels: Vec<u32>) -> Bitmap {
    Bitmap::from_pixels("src".into(), w, h, Pixels::Rgba(pixels), Vec::new(), false, false)
}

#[test]
fn straight_copy_lands_at_offset() {
    let src = bitmap_rgba(2, 2, vec![1, 2, 3, 4]);
    let mut canvas = Bitmap::canvas(4, 4, &[]);
    copy_pixels(&mut canvas, &src, 1, 2);
    match &canvas.pixels {
        Pixels::Rgba(p) => {
            assert_eq!(p[2 * 4 + 1], 1);
            assert_eq!(p[2 * 4 + 2], 2);
            assert_eq!(p[3 * 4 + 1], 3);
            assert_eq!(p[3 * 4 + 2], 4);
        }
        Pixels::Indexed(_) => panic!("expected rgba canvas"),
    }
}

#[test]
fn rotated_copy_is_exact_90_degrees_clockwise() {
    // 2x3 source:
    //   a b
    //   c d
    //   e f
    let (a, b, c, d, e, f) = (10, 11, 12, 13, 14, 15);
    let src = bitmap_rgba(2, 3, vec![a, b, c, d, e, f]);
    let mut canvas = Bitmap::canvas(3, 2, &[]);
    copy_pixels_rot(&mut canvas, &src, 0, 0);
    // rotated clockwise:
    //   e c a
    //   f d b
    match &canvas.pixels {
        Pixels::Rgba(p) => assert_eq!(p, &[e, c, a, f, d, b]),
        Pixels::Indexed(_) => panic!("expected rgba canvas"),
    }
}

#[test]
fn indexed_source_never_lands_on_rgba_canvas() {
    let src = Bitmap::from_pixels(
        "idx".into(),
        2,
        2,
        Pixels::Indexed(vec![1, 2, 3, 4]),
        vec![0; 4],
        false,
        false,
    );
    let mut canvas = Bitmap::canvas(4, 4, &[]);
    copy_pixels(&mut canvas, &src, 0, 0);
    match &canvas.pixels {
        Pixels::Rgba(p) => assert!(p.iter().all(|&px| px == 0)),
        Pixels::Indexed(_) => panic!("expected rgba canvas"),
    }
}

#[test]
fn palette_slot_matches_row_ignoring_alpha() {
    // page palette: 16 rows; row 3 holds the source colors
    let mut page_palette = vec![0u32; 256];
    for (j, entry) in page_palette[48..64].iter_mut().enumerate() {
        *entry = rgba(j as u8, 100, 200, 255);
    }
    let src_palette: Vec<u32> = (0..16).map(|j| rgba(j as u8, 100, 200, 0)).collect();

    let page = Bitmap::canvas(16, 16, &page_palette);
    let mut src = Bitmap::from_pixels(
        "idx".into(),
        1,
        1,
        Pixels::Indexed(vec![0]),
        src_palette,
        false,
        false,
    );
    find_palette_slot(&page, &mut src);
    assert_eq!(src.palette_slot, 3);
}

#[test]
fn palette_slot_defaults_to_zero_without_match() {
    let page_palette = vec![rgba(9, 9, 9, 255); 256];
    let src_palette: Vec<u32> = (0..16).map(|j| rgba(j as u8, 0, 0, 255)).collect();
    let page = Bitmap::canvas(16, 16, &page_palette);
    let mut src = Bitmap::from_pixels(
        "idx".into(),
        1,
        1,
        Pixels::Indexed(vec![0]),
        src_palette,
        false,
        false,
    );
    find_palette_slot(&page, &mut src);
    assert_eq!(src.palette_slot, 0);
}
