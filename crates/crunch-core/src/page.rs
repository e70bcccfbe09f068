//! One atlas page: accepts bitmaps from the pending stack, shrinks its
//! canvas to a power of two, renders pixels, and emits manifest
//! fragments.

use std::collections::HashMap;
use std::io::{self, Write};

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::binary::BinWriter;
use crate::bitmap::{Bitmap, Placement};
use crate::blit;
use crate::packer::{Heuristic, MaxRectsBin};

pub struct Page {
    /// Canvas bounds; start at the configured maxima and shrink after
    /// the last accepted bitmap.
    pub width: u32,
    pub height: u32,
    pad: u32,
    /// Placed bitmaps in insertion order (manifest order after
    /// `sort_for_manifest`).
    pub bitmaps: Vec<Bitmap>,
    dup_lookup: HashMap<u64, usize>,
}

impl Page {
    pub fn new(width: u32, height: u32, pad: u32) -> Page {
        Page {
            width,
            height,
            pad,
            bitmaps: Vec::new(),
            dup_lookup: HashMap::new(),
        }
    }

    /// Packs pending bitmaps from the back (largest first) until one no
    /// longer fits, taking ownership of each accepted bitmap. With
    /// `unique`, pixel-identical bitmaps become aliases of the primary
    /// already on the page. Ends with the power-of-two shrink.
    pub fn pack(&mut self, pending: &mut Vec<Bitmap>, unique: bool, rotate: bool) {
        let mut bin = MaxRectsBin::new(self.width, self.height);
        let mut extent_w = 0;
        let mut extent_h = 0;
        loop {
            let (hash, bitmap_w, bitmap_h) = match pending.last() {
                Some(b) => {
                    debug!(remaining = pending.len(), name = %b.name, "packing");
                    (b.hash_value, b.width, b.height)
                }
                None => break,
            };

            if unique {
                let primary = self.dup_lookup.get(&hash).copied().filter(|&idx| {
                    pending
                        .last()
                        .is_some_and(|candidate| self.bitmaps[idx].same_pixels(candidate))
                });
                if let Some(idx) = primary {
                    if let Some(pos) = self.bitmaps[idx].pos {
                        if let Some(mut alias) = pending.pop() {
                            alias.pos = Some(Placement {
                                dup_of: Some(idx),
                                ..pos
                            });
                            self.bitmaps.push(alias);
                            continue;
                        }
                    }
                }
            }

            let Some(placed) = bin.insert(
                bitmap_w + self.pad,
                bitmap_h + self.pad,
                rotate,
                Heuristic::BestShortSideFit,
            ) else {
                break;
            };
            if unique {
                self.dup_lookup.insert(hash, self.bitmaps.len());
            }
            let Some(mut bitmap) = pending.pop() else {
                break;
            };
            bitmap.pos = Some(Placement {
                x: placed.x,
                y: placed.y,
                rotated: placed.rotated,
                dup_of: None,
            });
            extent_w = extent_w.max(placed.x + placed.w);
            extent_h = extent_h.max(placed.y + placed.h);
            self.bitmaps.push(bitmap);
        }

        // smallest power-of-two canvas >= the padded extent
        while extent_w > 0 && self.width / 2 >= extent_w {
            self.width /= 2;
        }
        while extent_h > 0 && self.height / 2 >= extent_h {
            self.height /= 2;
        }
    }

    /// Renders the page into a fresh canvas, indexed when a page palette
    /// is given. Primaries get their 16-color slot scanned before the
    /// copy; aliases are skipped.
    pub fn render(&mut self, palette: &[u32]) -> Bitmap {
        let mut canvas = Bitmap::canvas(self.width, self.height, palette);
        for bitmap in &mut self.bitmaps {
            let Some(pos) = bitmap.pos else { continue };
            if pos.dup_of.is_some() {
                continue;
            }
            blit::find_palette_slot(&canvas, bitmap);
            if pos.rotated {
                blit::copy_pixels_rot(&mut canvas, bitmap, pos.x, pos.y);
            } else {
                blit::copy_pixels(&mut canvas, bitmap, pos.x, pos.y);
            }
        }
        canvas
    }

    /// Manifest ordering: by name, then frame index.
    pub fn sort_for_manifest(&mut self) {
        self.bitmaps
            .sort_by(|a, b| a.name.cmp(&b.name).then(a.frame_index.cmp(&b.frame_index)));
    }

    pub fn write_xml(&self, name: &str, out: &mut String, format: i32, trim: bool, rotate: bool) {
        out.push_str(&format!(
            "\t<tex n=\"{}\" w=\"{}\" h=\"{}\" format=\"{}\">\n",
            name, self.width, self.height, format
        ));
        for b in &self.bitmaps {
            let Some(pos) = b.pos else { continue };
            out.push_str(&format!(
                "\t\t<img fi=\"{}\" n=\"{}\" l=\"{}\" ld=\"{}\" d=\"{}\" x=\"{}\" y=\"{}\" w=\"{}\" h=\"{}\" ",
                b.frame_index, b.name, b.label, b.loop_direction, b.duration,
                pos.x, pos.y, b.width, b.height
            ));
            if trim {
                out.push_str(&format!(
                    "fx=\"{}\" fy=\"{}\" fw=\"{}\" fh=\"{}\" ",
                    b.frame_x, b.frame_y, b.frame_w, b.frame_h
                ));
            }
            if rotate {
                out.push_str(&format!("r=\"{}\" ", u8::from(pos.rotated)));
            }
            out.push_str(&format!("ps=\"{}\" />\n", b.palette_slot));
        }
        out.push_str("\t</tex>\n");
    }

    pub fn to_json(&self, name: &str, format: i32, trim: bool, rotate: bool) -> Value {
        let images: Vec<Value> = self
            .bitmaps
            .iter()
            .filter_map(|b| {
                let pos = b.pos?;
                let mut img = Map::new();
                img.insert("fi".into(), json!(b.frame_index));
                img.insert("n".into(), json!(b.name));
                img.insert("l".into(), json!(b.label));
                img.insert("ld".into(), json!(b.loop_direction));
                img.insert("d".into(), json!(b.duration));
                img.insert("x".into(), json!(pos.x));
                img.insert("y".into(), json!(pos.y));
                img.insert("w".into(), json!(b.width));
                img.insert("h".into(), json!(b.height));
                if trim {
                    img.insert("fx".into(), json!(b.frame_x));
                    img.insert("fy".into(), json!(b.frame_y));
                    img.insert("fw".into(), json!(b.frame_w));
                    img.insert("fh".into(), json!(b.frame_h));
                }
                if rotate {
                    img.insert("r".into(), json!(pos.rotated));
                }
                img.insert("ps".into(), json!(b.palette_slot));
                Some(Value::Object(img))
            })
            .collect();
        json!({
            "name": name,
            "width": self.width,
            "height": self.height,
            "format": format.to_string(),
            "images": images,
        })
    }

    pub fn write_bin<W: Write>(
        &self,
        name: &str,
        out: &mut BinWriter<W>,
        format: i32,
        trim: bool,
        rotate: bool,
    ) -> io::Result<()> {
        out.write_str(name)?;
        out.write_i16(self.width as i16)?;
        out.write_i16(self.height as i16)?;
        out.write_i16(format as i16)?;
        out.write_i16(self.bitmaps.len() as i16)?;
        for b in &self.bitmaps {
            let Some(pos) = b.pos else { continue };
            out.write_i16(b.frame_index as i16)?;
            out.write_str(&b.name)?;
            out.write_str(&b.label)?;
            out.write_u8(b.loop_direction)?;
            out.write_i16(b.duration as i16)?;
            out.write_i16(pos.x as i16)?;
            out.write_i16(pos.y as i16)?;
            out.write_i16(b.width as i16)?;
            out.write_i16(b.height as i16)?;
            if trim {
                out.write_i16(b.frame_x as i16)?;
                out.write_i16(b.frame_y as i16)?;
                out.write_i16(b.frame_w as i16)?;
                out.write_i16(b.frame_h as i16)?;
            }
            if rotate {
                out.write_u8(u8::from(pos.rotated))?;
            }
            out.write_u8(b.palette_slot)?;
        }
        Ok(())
    }
}
