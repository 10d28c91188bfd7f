//! Core library for laying out sprites on a single sheet.
//!
//! - Preprocessing: opaque-bounds crop, transparent expand, smooth scale (`preprocess`)
//! - Placement: MaxRects (BAF/BSSF/BLSF/BL/CP, optional rotation) or rows (`layout::run_layout`)
//! - Output: rendered RGBA sheet (`compositing`), converted to the chosen storage format
//!   (`pixel_format`), and atlas metadata for several engines (`export`)
//!
//! The input order is significant and never changed by the layout engine; sort first
//! with [`sort_sprites`] if needed.
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use spritebunch_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let mut sprites = vec![
//!     SpriteRecord::from_dynamic("a.png", ImageReader::open("a.png")?.decode()?),
//!     SpriteRecord::from_dynamic("b.png", ImageReader::open("b.png")?.decode()?),
//! ];
//! sort_sprites(&mut sprites, SortOrder::AreaDesc);
//! let sheet = SheetConfig::new(512, 512).with_padding(2);
//! let report = run_layout(&sheet, &mut sprites, &LayoutOptions::default())?;
//! println!("{}", report.summary());
//! let json = AtlasFormat::Json.render(&sheet, "sheet", &sprites)?;
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod export_plist;
pub mod export_text;
pub mod export_xml;
pub mod layout;
pub mod model;
pub mod packer;
pub mod pixel_format;
pub mod preprocess;
pub mod sprite;

pub use compositing::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use export_plist::*;
pub use export_text::*;
pub use export_xml::*;
pub use layout::*;
pub use model::*;
pub use packer::*;
pub use pixel_format::*;
pub use sprite::*;

/// Convenience prelude for common types and functions.
/// Importing `spritebunch_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::compositing::render_sheet;
    pub use crate::config::{
        LayoutOptions, LayoutOptionsBuilder, MaxRectsHeuristic, PackMethod, SheetConfig,
        SortOrder,
    };
    pub use crate::export::{AtlasFormat, export_atlas};
    pub use crate::layout::{LayoutReport, run_layout};
    pub use crate::model::Rect;
    pub use crate::packer::{FreeRectBin, maxrects::MaxRectsBin, rows::RowPacker};
    pub use crate::pixel_format::SheetPixelFormat;
    pub use crate::sprite::{SpriteRecord, sort_sprites};
}
