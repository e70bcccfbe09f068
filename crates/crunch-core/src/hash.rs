//! Stable 64-bit hashing for the build cache and the dedup layer.
//!
//! The digest is an order-sensitive fold, so it is reproducible across
//! runs and platforms given identical inputs.

use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use walkdir::WalkDir;

use crate::error::Result;

/// Accumulates values into a 64-bit digest, seeded at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtlasHasher {
    state: u64,
}

impl AtlasHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one value into the digest.
    pub fn combine(&mut self, value: u64) {
        let h = self.state;
        self.state = h
            ^ value
                .wrapping_add(0x9e37_79b9)
                .wrapping_add(h << 6)
                .wrapping_add(h >> 2);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.combine(u64::from(b));
        }
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn finish(&self) -> u64 {
        self.state
    }
}

/// Folds one file into the digest: its full contents, or the pair
/// (path, mtime in UTC seconds) when `mtime_only` is set.
pub fn hash_file(hasher: &mut AtlasHasher, path: &Path, mtime_only: bool) -> Result<()> {
    if mtime_only {
        hasher.write_str(&path.to_string_lossy().replace('\\', "/"));
        let modified = fs::metadata(path)?.modified()?;
        let secs = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        hasher.combine(secs);
    } else {
        hasher.write_bytes(&fs::read(path)?);
    }
    Ok(())
}

/// Folds every regular file under `root` into the digest, depth-first in
/// name order.
pub fn hash_tree(hasher: &mut AtlasHasher, root: &Path, mtime_only: bool) -> Result<()> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            hash_file(hasher, entry.path(), mtime_only)?;
        }
    }
    Ok(())
}

/// Reads a stored digest; `None` when the sidecar is missing or garbled.
pub fn load_hash(path: &Path) -> Option<u64> {
    let text = fs::read_to_string(path).ok()?;
    u64::from_str_radix(text.trim(), 16).ok()
}

pub fn save_hash(path: &Path, hash: u64) -> Result<()> {
    fs::write(path, format!("{hash:016x}\n"))?;
    Ok(())
}
