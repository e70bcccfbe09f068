use std::fs;
use std::path::PathBuf;

use crunch_core::bitmap::rgba;
use crunch_core::palette::read_palette;
use tempfile::{tempdir, TempDir};

fn write_palette(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).expect("write palette");
    path
}

#[test]
fn act_without_footer_has_256_colors() {
    let dir = tempdir().expect("tempdir");
    let mut bytes = Vec::with_capacity(768);
    for i in 0..256u32 {
        bytes.extend_from_slice(&[i as u8, 0, 255 - i as u8]);
    }
    let palette = read_palette(&write_palette(&dir, "colors.act", &bytes)).expect("parse");
    assert_eq!(palette.colors.len(), 256);
    assert_eq!(palette.colors[1], rgba(1, 0, 254, 255));
    assert_eq!(palette.transparent_index, 0);
}

#[test]
fn act_footer_sets_count_and_transparent_index() {
    let dir = tempdir().expect("tempdir");
    let mut bytes = vec![0u8; 768];
    bytes[0..3].copy_from_slice(&[10, 20, 30]);
    // big-endian footer: 4 colors, transparent index 2
    bytes.extend_from_slice(&[0, 4, 0, 2]);
    let palette = read_palette(&write_palette(&dir, "colors.act", &bytes)).expect("parse");
    assert_eq!(palette.colors.len(), 4);
    assert_eq!(palette.colors[0], rgba(10, 20, 30, 255));
    assert_eq!(palette.transparent_index, 2);
}

#[test]
fn jasc_parses_count_and_rgb_lines() {
    let dir = tempdir().expect("tempdir");
    let text = "JASC-PAL\r\n0100\r\n2\r\n255 0 0\r\n0 255 0\r\n";
    let palette = read_palette(&write_palette(&dir, "colors.pal", text.as_bytes())).expect("parse");
    assert_eq!(
        palette.colors,
        vec![rgba(255, 0, 0, 255), rgba(0, 255, 0, 255)]
    );
}

#[test]
fn mspal_riff_chunk_parses_entries() {
    let dir = tempdir().expect("tempdir");
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&20u32.to_le_bytes());
    bytes.extend_from_slice(b"PAL ");
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&12u32.to_le_bytes());
    bytes.extend_from_slice(&0x0300u16.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&[1, 2, 3, 255]);
    bytes.extend_from_slice(&[4, 5, 6, 255]);
    let palette = read_palette(&write_palette(&dir, "colors.mspal", &bytes)).expect("parse");
    assert_eq!(palette.colors, vec![rgba(1, 2, 3, 255), rgba(4, 5, 6, 255)]);
}

#[test]
fn gimp_skips_header_lines() {
    let dir = tempdir().expect("tempdir");
    let text = "GIMP Palette\nName: demo\nColumns: 0\n#\n  1   2   3\tfirst\n255 254 253\tsecond\n";
    let palette = read_palette(&write_palette(&dir, "colors.gpl", text.as_bytes())).expect("parse");
    assert_eq!(
        palette.colors,
        vec![rgba(1, 2, 3, 255), rgba(255, 254, 253, 255)]
    );
}

#[test]
fn paint_net_parses_hex_lines_ignoring_alpha_byte() {
    let dir = tempdir().expect("tempdir");
    let text = "; Paint.NET Palette\n; demo\nFF112233\n80445566\n";
    let palette = read_palette(&write_palette(&dir, "colors.txt", text.as_bytes())).expect("parse");
    assert_eq!(
        palette.colors,
        vec![rgba(0x11, 0x22, 0x33, 255), rgba(0x44, 0x55, 0x66, 255)]
    );
}

#[test]
fn indexed_png_palette_keeps_trns_alpha() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("colors.png");
    let file = fs::File::create(&path).expect("create");
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), 2, 1);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(vec![10, 20, 30, 40, 50, 60]);
    encoder.set_trns(vec![128]);
    let mut writer = encoder.write_header().expect("header");
    writer.write_image_data(&[0, 1]).expect("pixels");
    writer.finish().expect("finish");

    let palette = read_palette(&path).expect("parse");
    assert_eq!(
        palette.colors,
        vec![rgba(10, 20, 30, 128), rgba(40, 50, 60, 255)]
    );
}

#[test]
fn unreadable_palette_is_an_error() {
    let dir = tempdir().expect("tempdir");
    assert!(read_palette(&dir.path().join("missing.act")).is_err());
}
