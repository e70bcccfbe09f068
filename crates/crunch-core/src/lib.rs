//! Core library for building sprite atlases.
//!
//! - Loads PNG files and indexed Aseprite frames into bitmaps (optionally
//!   premultiplied and trimmed), hashing each one by content.
//! - Packs them into the fewest power-of-two pages that fit the configured
//!   bounds with a MaxRects free-list packer; supports 90-degree rotation
//!   and content-hash deduplication.
//! - Emits the pages as PNG plus an XML, JSON, or binary `crch` manifest,
//!   and skips rebuilds whose inputs and arguments are unchanged.
//!
//! Quick example:
//! ```ignore
//! use crunch_core::{BuildJob, Options};
//! let job = BuildJob {
//!     output_dir: "bin/atlases".into(),
//!     name: "atlas".into(),
//!     inputs: vec!["assets/characters".into(), "assets/tiles".into()],
//!     args: std::env::args().skip(1).collect(),
//!     options: Options::default(),
//! };
//! match job.run()? {
//!     crunch_core::BuildOutcome::Built => {}
//!     crunch_core::BuildOutcome::Unchanged => println!("atlas is unchanged"),
//! }
//! # Ok::<(), crunch_core::CrunchError>(())
//! ```

pub mod binary;
pub mod bitmap;
pub mod blit;
pub mod config;
pub mod error;
pub mod hash;
pub mod loader;
pub mod packer;
pub mod page;
pub mod palette;
pub mod pipeline;

pub use bitmap::{Bitmap, Pixels, Placement};
pub use config::{BinStringType, Options, OutputFormat};
pub use error::{CrunchError, Result};
pub use page::Page;
pub use pipeline::{BuildJob, BuildOutcome};
