//! Layout engine for sprite atlases.
//!
//! - Packing: MaxRects (BSSF/BLSF) over a fixed canvas, driven by a canvas-sizing search
//! - Pre-pass: alpha trimming (lenient/strict) and pixel-exact duplicate elimination
//! - Pipeline: `pack_images` / `pack_files` return one RGBA canvas plus a frame table;
//!   `pack_layout` does the same geometry without pixels
//! - Data model is serde-serializable; JSON and plist writers are provided as helpers.
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use spritesheet_core::{AtlasConfig, InputImage, pack_images};
//! # fn main() -> anyhow::Result<()> {
//! let img1 = ImageReader::open("a.png")?.decode()?;
//! let img2 = ImageReader::open("b.png")?.decode()?;
//! let inputs = vec![
//!   InputImage { key: "a".into(), image: img1 },
//!   InputImage { key: "b".into(), image: img2 },
//! ];
//! let cfg = AtlasConfig { max_width: 1024, max_height: 1024, ..Default::default() };
//! let out = pack_images(inputs, cfg)?;
//! println!("atlas: {}x{}", out.atlas.width, out.atlas.height);
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod dedup;
pub mod error;
pub mod export;
pub mod export_plist;
pub mod model;
pub mod order;
pub mod packer;
pub mod pipeline;
pub mod sizing;
pub mod trim;

pub use config::*;
pub use error::*;
pub use export::*;
pub use export_plist::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `spritesheet_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        AtlasConfig, AtlasConfigBuilder, MaxRectsHeuristic, PixelFormat, SortMode,
        TransparentPolicy, TrimMode,
    };
    pub use crate::error::SpritesheetError;
    pub use crate::model::{Atlas, Frame, Meta, PackStats, Rect};
    pub use crate::packer::{Placement, maxrects::MaxRectsPacker};
    pub use crate::pipeline::{LayoutItem, SourceFile};
    pub use crate::{InputImage, PackOutput, pack_files, pack_images, pack_layout};
}
