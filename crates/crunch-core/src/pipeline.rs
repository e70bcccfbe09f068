//! Build orchestration: the content-addressed cache gate, the multi-page
//! pack loop, output emission, and the per-directory partition mode.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::binary::{self, BinWriter};
use crate::config::{Options, OutputFormat};
use crate::error::{CrunchError, Result};
use crate::hash::{self, AtlasHasher};
use crate::loader;
use crate::page::Page;
use crate::palette;

const BIN_MAGIC: &[u8; 4] = b"crch";
const BIN_VERSION: i16 = 0;

/// Outcome of a build: work done, or skipped because nothing changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built,
    Unchanged,
}

/// One atlas build request. Everything the pipeline touches travels in
/// this record; there is no process-wide state.
#[derive(Debug, Clone)]
pub struct BuildJob {
    pub output_dir: PathBuf,
    /// Atlas name; outputs are `<name>.hash`, `<name><i>.png`, and one
    /// manifest file.
    pub name: String,
    /// Comma-split input paths: files or directories.
    pub inputs: Vec<String>,
    /// Raw command-line arguments, folded into the cache key.
    pub args: Vec<String>,
    pub options: Options,
}

impl BuildJob {
    pub fn run(&self) -> Result<BuildOutcome> {
        if self.options.dirs {
            self.run_partitioned()
        } else {
            self.run_single(&self.name, &self.inputs, "")
        }
    }

    /// Digest over input files (contents or mtimes per `last`),
    /// directories recursively in sorted order, then every argument.
    fn input_hash(&self, inputs: &[String]) -> Result<u64> {
        let mut hasher = AtlasHasher::new();
        for input in inputs {
            let path = Path::new(input);
            if path.is_dir() {
                hash::hash_tree(&mut hasher, path, self.options.last)?;
            } else {
                hash::hash_file(&mut hasher, path, self.options.last)?;
            }
        }
        for arg in &self.args {
            hasher.write_str(arg);
        }
        Ok(hasher.finish())
    }

    fn run_single(&self, name: &str, inputs: &[String], prefix: &str) -> Result<BuildOutcome> {
        let started = Instant::now();
        let new_hash = self.input_hash(inputs)?;
        let hash_path = self.output_dir.join(format!("{name}.hash"));
        if !self.options.ignore {
            if let Some(old_hash) = hash::load_hash(&hash_path) {
                if old_hash == new_hash {
                    debug!(name, "hash unchanged, skipping build");
                    return Ok(BuildOutcome::Unchanged);
                }
            }
        }

        self.sweep_stale(name)?;

        info!(name, "loading images");
        let mut bitmaps = loader::load_inputs(inputs, prefix, &self.options)?;
        bitmaps.sort_by_key(|b| u64::from(b.width) * u64::from(b.height));

        info!(count = bitmaps.len(), "packing bitmaps");
        let mut pages: Vec<Page> = Vec::new();
        while !bitmaps.is_empty() {
            let mut page = Page::new(
                self.options.max_width,
                self.options.max_height,
                self.options.padding,
            );
            page.pack(&mut bitmaps, self.options.unique, self.options.rotate);
            if page.bitmaps.is_empty() {
                let name = bitmaps.last().map(|b| b.name.clone()).unwrap_or_default();
                return Err(CrunchError::PackFailure { name });
            }
            debug!(
                page = pages.len(),
                width = page.width,
                height = page.height,
                "finished page"
            );
            pages.push(page);
        }

        let no_zero = self.options.nozero && pages.len() == 1;
        let page_names: Vec<String> = (0..pages.len())
            .map(|i| {
                if no_zero {
                    name.to_string()
                } else {
                    format!("{name}{i}")
                }
            })
            .collect();

        let page_palette = match &self.options.palette_file {
            Some(path) => palette::read_palette(path)?.colors,
            None => Vec::new(),
        };

        for (page, page_name) in pages.iter_mut().zip(&page_names) {
            let png_path = self.output_dir.join(format!("{page_name}.png"));
            debug!(path = %png_path.display(), "writing png");
            page.render(&page_palette).save_png(&png_path)?;
        }

        for page in &mut pages {
            page.sort_for_manifest();
        }

        self.emit_manifest(name, &pages, &page_names)?;

        hash::save_hash(&hash_path, new_hash)?;
        info!(
            name,
            pages = pages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "atlas built"
        );
        Ok(BuildOutcome::Built)
    }

    /// Removes every output a previous build may have left for `name`.
    fn sweep_stale(&self, name: &str) -> Result<()> {
        let mut stale = vec![
            format!("{name}.hash"),
            format!("{name}.crch"),
            format!("{name}.xml"),
            format!("{name}.json"),
            format!("{name}.png"),
        ];
        for i in 0..16 {
            stale.push(format!("{name}{i}.png"));
        }
        for file in stale {
            remove_if_present(&self.output_dir.join(file))?;
        }
        Ok(())
    }

    /// Writes the manifest for one build. In partition mode the file is
    /// a fragment: the binary form starts at its page count and the
    /// text forms omit the document wrapper, so the merge can
    /// concatenate fragments directly.
    fn emit_manifest(&self, name: &str, pages: &[Page], page_names: &[String]) -> Result<()> {
        let o = &self.options;
        match o.output_format {
            OutputFormat::Bin => {
                let path = self.output_dir.join(format!("{name}.crch"));
                debug!(path = %path.display(), "writing bin");
                let mut writer = BinWriter::new(Vec::new(), o.binstr);
                if !o.dirs {
                    for &b in BIN_MAGIC {
                        writer.write_u8(b)?;
                    }
                    writer.write_i16(BIN_VERSION)?;
                    writer.write_u8(u8::from(o.trim))?;
                    writer.write_u8(u8::from(o.rotate))?;
                    writer.write_u8(o.binstr.code())?;
                }
                writer.write_i16(pages.len() as i16)?;
                for (page, page_name) in pages.iter().zip(page_names) {
                    page.write_bin(page_name, &mut writer, o.texture_format, o.trim, o.rotate)?;
                }
                fs::write(path, writer.into_inner())?;
            }
            OutputFormat::Xml => {
                let path = self.output_dir.join(format!("{name}.xml"));
                debug!(path = %path.display(), "writing xml");
                let mut xml = String::new();
                if !o.dirs {
                    xml.push_str("<atlas>\n");
                    xml.push_str(&format!("\t<trim>{}</trim>\n", o.trim));
                    xml.push_str(&format!("\t<rotate>{}</rotate>\n", o.rotate));
                }
                for (page, page_name) in pages.iter().zip(page_names) {
                    page.write_xml(page_name, &mut xml, o.texture_format, o.trim, o.rotate);
                }
                if !o.dirs {
                    xml.push_str("</atlas>\n");
                }
                fs::write(path, xml)?;
            }
            OutputFormat::Json => {
                let path = self.output_dir.join(format!("{name}.json"));
                debug!(path = %path.display(), "writing json");
                let text = if o.dirs {
                    let mut fragments = Vec::with_capacity(pages.len());
                    for (page, page_name) in pages.iter().zip(page_names) {
                        fragments.push(serde_json::to_string_pretty(&page.to_json(
                            page_name,
                            o.texture_format,
                            o.trim,
                            o.rotate,
                        ))?);
                    }
                    fragments.join(",\n")
                } else {
                    let textures: Vec<serde_json::Value> = pages
                        .iter()
                        .zip(page_names)
                        .map(|(page, page_name)| {
                            page.to_json(page_name, o.texture_format, o.trim, o.rotate)
                        })
                        .collect();
                    serde_json::to_string_pretty(&serde_json::json!({
                        "trim": o.trim,
                        "rotate": o.rotate,
                        "textures": textures,
                    }))?
                };
                fs::write(path, text)?;
            }
        }
        Ok(())
    }

    /// One atlas per immediate subdirectory of the first non-png input,
    /// then a merge of the per-partition manifest fragments. Partitions
    /// whose hashes match are skipped; if all were skipped the top-level
    /// manifest is left untouched.
    fn run_partitioned(&self) -> Result<BuildOutcome> {
        let root = self
            .inputs
            .iter()
            .find(|input| !input.ends_with(".png"))
            .ok_or_else(|| {
                CrunchError::InvalidInput("could not find directories in input".into())
            })?;

        let mut subdirs: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                subdirs.push(entry.path());
            }
        }
        subdirs.sort();

        let name_prefix = format!("{}_", self.name);
        let mut any_built = false;
        for subdir in &subdirs {
            let sub_name = subdir
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let part_name = format!("{name_prefix}{sub_name}");
            let part_inputs = vec![subdir.to_string_lossy().replace('\\', "/")];
            match self.run_single(&part_name, &part_inputs, &format!("{sub_name}/"))? {
                BuildOutcome::Built => any_built = true,
                BuildOutcome::Unchanged => debug!(partition = %sub_name, "partition unchanged"),
            }
        }

        if !any_built {
            return Ok(BuildOutcome::Unchanged);
        }

        for ext in ["crch", "xml", "json"] {
            remove_if_present(&self.output_dir.join(format!("{}.{ext}", self.name)))?;
        }

        match self.options.output_format {
            OutputFormat::Bin => self.merge_bin(&name_prefix)?,
            OutputFormat::Xml => self.merge_xml(&name_prefix)?,
            OutputFormat::Json => self.merge_json(&name_prefix)?,
        }
        Ok(BuildOutcome::Built)
    }

    /// Fragment files for the given extension, in name order.
    fn find_fragments(&self, name_prefix: &str, ext: &str) -> Result<Vec<PathBuf>> {
        let suffix = format!(".{ext}");
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.output_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if file_name.starts_with(name_prefix) && file_name.ends_with(&suffix) {
                found.push(entry.path());
            }
        }
        found.sort();
        Ok(found)
    }

    /// Re-emits the top-level header, sums the fragments' leading page
    /// counts, and concatenates their bodies.
    fn merge_bin(&self, name_prefix: &str) -> Result<()> {
        let o = &self.options;
        let fragments = self.find_fragments(name_prefix, "crch")?;
        let mut total: i16 = 0;
        let mut bodies: Vec<Vec<u8>> = Vec::with_capacity(fragments.len());
        for path in &fragments {
            let bytes = fs::read(path)?;
            let mut cursor = &bytes[..];
            total += binary::read_i16(&mut cursor)?;
            bodies.push(cursor.to_vec());
        }

        let path = self.output_dir.join(format!("{}.crch", self.name));
        debug!(path = %path.display(), fragments = fragments.len(), "writing merged bin");
        let mut writer = BinWriter::new(Vec::new(), o.binstr);
        for &b in BIN_MAGIC {
            writer.write_u8(b)?;
        }
        writer.write_i16(BIN_VERSION)?;
        writer.write_u8(u8::from(o.trim))?;
        writer.write_u8(u8::from(o.rotate))?;
        writer.write_u8(o.binstr.code())?;
        writer.write_i16(total)?;
        let mut out = writer.into_inner();
        for body in bodies {
            out.extend_from_slice(&body);
        }
        fs::write(path, out)?;
        Ok(())
    }

    fn merge_xml(&self, name_prefix: &str) -> Result<()> {
        let o = &self.options;
        let path = self.output_dir.join(format!("{}.xml", self.name));
        debug!(path = %path.display(), "writing merged xml");
        let mut xml = String::from("<atlas>\n");
        xml.push_str(&format!("\t<trim>{}</trim>\n", o.trim));
        xml.push_str(&format!("\t<rotate>{}</rotate>\n", o.rotate));
        for fragment in self.find_fragments(name_prefix, "xml")? {
            xml.push_str(&fs::read_to_string(fragment)?);
        }
        xml.push_str("</atlas>\n");
        fs::write(path, xml)?;
        Ok(())
    }

    fn merge_json(&self, name_prefix: &str) -> Result<()> {
        let o = &self.options;
        let path = self.output_dir.join(format!("{}.json", self.name));
        debug!(path = %path.display(), "writing merged json");
        let mut parts = Vec::new();
        for fragment in self.find_fragments(name_prefix, "json")? {
            let text = fs::read_to_string(fragment)?;
            if !text.trim().is_empty() {
                parts.push(text);
            }
        }
        let text = format!(
            "{{\n\"trim\": {},\n\"rotate\": {},\n\"textures\": [\n{}\n]\n}}\n",
            o.trim,
            o.rotate,
            parts.join(",\n")
        );
        fs::write(path, text)?;
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
