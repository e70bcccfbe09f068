use crunch_core::bitmap::{rgba, Bitmap, Pixels};

fn rgba_canvas(w: u32, h: u32) -> Vec<u32> {
    vec![0; (w * h) as usize]
}

#[test]
fn trim_records_offsets_into_original_frame() {
    let (w, h) = (32u32, 32u32);
    let mut pixels = rgba_canvas(w, h);
    for y in 2..=29u32 {
        for x in 4..=27u32 {
            pixels[(y * w + x) as usize] = rgba(255, 255, 255, 255);
        }
    }
    let bitmap = Bitmap::from_pixels(
        "sprite".into(),
        w,
        h,
        Pixels::Rgba(pixels),
        Vec::new(),
        false,
        true,
    );
    assert_eq!(bitmap.width, 24);
    assert_eq!(bitmap.height, 28);
    assert_eq!(bitmap.frame_x, -4);
    assert_eq!(bitmap.frame_y, -2);
    assert_eq!(bitmap.frame_w, 32);
    assert_eq!(bitmap.frame_h, 32);
    match &bitmap.pixels {
        Pixels::Rgba(p) => assert_eq!(p.len(), 24 * 28),
        Pixels::Indexed(_) => panic!("expected rgba storage"),
    }
}

#[test]
fn fully_transparent_image_keeps_original_bounds() {
    let bitmap = Bitmap::from_pixels(
        "empty".into(),
        8,
        8,
        Pixels::Rgba(rgba_canvas(8, 8)),
        Vec::new(),
        false,
        true,
    );
    assert_eq!((bitmap.width, bitmap.height), (8, 8));
    assert_eq!((bitmap.frame_x, bitmap.frame_y), (0, 0));
}

#[test]
fn trim_disabled_keeps_buffer() {
    let mut pixels = rgba_canvas(8, 8);
    pixels[9] = rgba(1, 2, 3, 255);
    let bitmap = Bitmap::from_pixels(
        "kept".into(),
        8,
        8,
        Pixels::Rgba(pixels),
        Vec::new(),
        false,
        false,
    );
    assert_eq!((bitmap.width, bitmap.height), (8, 8));
}

#[test]
fn indexed_trim_uses_nonzero_indices() {
    let mut indices = vec![0u8; 16];
    indices[5] = 3; // (1,1)
    indices[10] = 7; // (2,2)
    let bitmap = Bitmap::from_pixels(
        "tiles".into(),
        4,
        4,
        Pixels::Indexed(indices),
        vec![0; 8],
        false,
        true,
    );
    assert_eq!((bitmap.width, bitmap.height), (2, 2));
    assert_eq!((bitmap.frame_x, bitmap.frame_y), (-1, -1));
    match &bitmap.pixels {
        Pixels::Indexed(p) => assert_eq!(p, &[3, 0, 0, 7]),
        Pixels::Rgba(_) => panic!("expected indexed storage"),
    }
}

#[test]
fn premultiply_floors_each_channel() {
    let pixels = vec![rgba(200, 100, 50, 128)];
    let bitmap = Bitmap::from_pixels(
        "pm".into(),
        1,
        1,
        Pixels::Rgba(pixels),
        Vec::new(),
        true,
        false,
    );
    match &bitmap.pixels {
        Pixels::Rgba(p) => assert_eq!(p[0], rgba(100, 50, 25, 128)),
        Pixels::Indexed(_) => panic!("expected rgba storage"),
    }
}

#[test]
fn content_hash_tracks_pixels_only() {
    let a = Bitmap::from_pixels(
        "a".into(),
        2,
        2,
        Pixels::Rgba(vec![1, 2, 3, 4]),
        Vec::new(),
        false,
        false,
    );
    let b = Bitmap::from_pixels(
        "b".into(),
        2,
        2,
        Pixels::Rgba(vec![1, 2, 3, 4]),
        Vec::new(),
        false,
        false,
    );
    let c = Bitmap::from_pixels(
        "c".into(),
        2,
        2,
        Pixels::Rgba(vec![1, 2, 3, 5]),
        Vec::new(),
        false,
        false,
    );
    assert_eq!(a.hash_value, b.hash_value);
    assert!(a.same_pixels(&b));
    assert_ne!(a.hash_value, c.hash_value);
    assert!(!a.same_pixels(&c));
}
