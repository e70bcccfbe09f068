use std::fs;

use crunch_core::hash::{hash_file, hash_tree, load_hash, save_hash, AtlasHasher};
use tempfile::tempdir;

#[test]
fn first_fold_matches_the_mixer() {
    let mut hasher = AtlasHasher::new();
    hasher.combine(0);
    assert_eq!(hasher.finish(), 0x9e37_79b9);
}

#[test]
fn folding_is_order_sensitive() {
    let mut ab = AtlasHasher::new();
    ab.write_str("ab");
    let mut ba = AtlasHasher::new();
    ba.write_str("ba");
    assert_ne!(ab.finish(), ba.finish());
}

#[test]
fn file_hash_follows_contents() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("input.bin");
    fs::write(&path, b"one").expect("write");

    let mut first = AtlasHasher::new();
    hash_file(&mut first, &path, false).expect("hash");
    let mut second = AtlasHasher::new();
    hash_file(&mut second, &path, false).expect("hash");
    assert_eq!(first.finish(), second.finish());

    fs::write(&path, b"two").expect("write");
    let mut third = AtlasHasher::new();
    hash_file(&mut third, &path, false).expect("hash");
    assert_ne!(first.finish(), third.finish());
}

#[test]
fn mtime_hash_is_stable_between_calls() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("input.bin");
    fs::write(&path, b"payload").expect("write");

    let mut first = AtlasHasher::new();
    hash_file(&mut first, &path, true).expect("hash");
    let mut second = AtlasHasher::new();
    hash_file(&mut second, &path, true).expect("hash");
    assert_eq!(first.finish(), second.finish());
}

#[test]
fn tree_hash_covers_nested_files() {
    let dir = tempdir().expect("tempdir");
    fs::create_dir(dir.path().join("sub")).expect("mkdir");
    fs::write(dir.path().join("a.bin"), b"a").expect("write");
    fs::write(dir.path().join("sub/b.bin"), b"b").expect("write");

    let mut first = AtlasHasher::new();
    hash_tree(&mut first, dir.path(), false).expect("hash");

    fs::write(dir.path().join("sub/b.bin"), b"changed").expect("write");
    let mut second = AtlasHasher::new();
    hash_tree(&mut second, dir.path(), false).expect("hash");
    assert_ne!(first.finish(), second.finish());
}

#[test]
fn sidecar_roundtrip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("atlas.hash");
    save_hash(&path, 0xdead_beef_0123_4567).expect("save");
    assert_eq!(load_hash(&path), Some(0xdead_beef_0123_4567));
    assert_eq!(load_hash(&dir.path().join("missing.hash")), None);
}
