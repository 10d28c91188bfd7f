//! Layout orchestration: reset, preprocess and place every sprite in list order.
//!
//! Packed rectangles stay in interior space here. The border offset and padding
//! subtraction happen once, in [`SpriteRecord::export_rect`], for every consumer.

use crate::config::{LayoutOptions, PackMethod, SheetConfig};
use crate::error::Result;
use crate::packer::maxrects::MaxRectsBin;
use crate::packer::rows::RowPacker;
use crate::packer::FreeRectBin;
use crate::preprocess::Preprocess;
use crate::sprite::SpriteRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Outcome of one layout run. Partial failure is a normal result, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    /// Sprites that received a packed rectangle.
    pub placed: usize,
    /// Sprites that did not fit.
    pub failed: usize,
    /// Sprites skipped because their image has no pixels.
    pub ignored: usize,
    /// Fraction of the interior covered by packed boxes (0.0 to 1.0).
    pub occupancy: f32,
}

impl LayoutReport {
    pub fn all_placed(&self) -> bool {
        self.failed == 0
    }

    /// Returns a human-readable summary of the run.
    pub fn summary(&self) -> String {
        format!(
            "Placed: {}, Failed: {}, Ignored: {}, Occupancy: {:.2}%",
            self.placed,
            self.failed,
            self.ignored,
            self.occupancy * 100.0
        )
    }
}

/// Lays out `sprites` on one sheet and reports how many did not fit.
///
/// Every record is reset first, so repeated runs never compound earlier crop, expand
/// or scale results. Only invalid configuration is an error.
#[instrument(skip_all, fields(sprites = sprites.len(), method = ?options.method))]
pub fn run_layout(
    sheet: &SheetConfig,
    sprites: &mut [SpriteRecord],
    options: &LayoutOptions,
) -> Result<LayoutReport> {
    sheet.validate()?;
    options.validate()?;
    options.validate_for(sheet)?;

    let report = match options.method {
        PackMethod::MaxRects => {
            let (iw, ih) = sheet.interior();
            let mut bin = MaxRectsBin::new(iw, ih, options.allow_rotation);
            pack_free_rects(&mut bin, sheet, sprites, options)
        }
        PackMethod::Rows => pack_rows(sheet, sprites, options),
    };
    info!(
        placed = report.placed,
        failed = report.failed,
        ignored = report.ignored,
        occupancy = format!("{:.2}%", report.occupancy * 100.0),
        "layout finished"
    );
    Ok(report)
}

/// Drives a free-rectangle bin over the sprite list.
///
/// Rotation is inferred from the returned rectangle: when its aspect differs from the
/// sprite's, the bin turned it. Square sprites are never reported as rotated.
pub fn pack_free_rects<B: FreeRectBin>(
    bin: &mut B,
    sheet: &SheetConfig,
    sprites: &mut [SpriteRecord],
    options: &LayoutOptions,
) -> LayoutReport {
    reset_all(sprites);
    let (iw, ih) = sheet.interior();
    bin.init(iw, ih, options.allow_rotation);
    let prep = Preprocess::from(options);
    let mut report = LayoutReport::default();

    for sprite in sprites.iter_mut() {
        prep.apply(sprite);
        if sprite.is_empty() {
            warn!(file = sprite.file_name(), "ignoring sprite with empty image");
            report.ignored += 1;
            continue;
        }
        let (w, h) = sprite.current().dimensions();
        let boxed = w
            .checked_add(sheet.padding)
            .zip(h.checked_add(sheet.padding));
        let placed = boxed.and_then(|(bw, bh)| bin.insert(bw, bh, options.heuristic));
        match placed {
            Some(rect) if !rect.is_empty() => {
                sprite.set_packed_rect(rect);
                if (w > h && rect.w < rect.h) || (w < h && rect.w > rect.h) {
                    sprite.set_rotated(true);
                }
                debug!(
                    file = sprite.file_name(),
                    x = rect.x,
                    y = rect.y,
                    w = rect.w,
                    h = rect.h,
                    rotated = sprite.is_rotated(),
                    free = format!("{:.1}%", 100.0 - bin.occupancy() * 100.0),
                    "packed"
                );
                report.placed += 1;
            }
            _ => {
                debug!(file = sprite.file_name(), w, h, "could not pack sprite");
                report.failed += 1;
            }
        }
    }
    report.occupancy = bin.occupancy();
    report
}

/// Places sprites with the row packer. Rotation is never applied.
pub fn pack_rows(
    sheet: &SheetConfig,
    sprites: &mut [SpriteRecord],
    options: &LayoutOptions,
) -> LayoutReport {
    reset_all(sprites);
    let (iw, ih) = sheet.interior();
    let mut rows = RowPacker::new(iw, ih, sheet.padding);
    let prep = Preprocess::from(options);
    let mut report = LayoutReport::default();
    let mut used_area = 0u64;

    for sprite in sprites.iter_mut() {
        prep.apply(sprite);
        if sprite.is_empty() {
            warn!(file = sprite.file_name(), "ignoring sprite with empty image");
            report.ignored += 1;
            continue;
        }
        let (w, h) = sprite.current().dimensions();
        match rows.place(w, h) {
            Some(rect) => {
                sprite.set_packed_rect(rect);
                used_area += rect.area();
                debug!(
                    file = sprite.file_name(),
                    x = rect.x,
                    y = rect.y,
                    w = rect.w,
                    h = rect.h,
                    "packed"
                );
                report.placed += 1;
            }
            None => {
                debug!(file = sprite.file_name(), w, h, "could not pack sprite");
                report.failed += 1;
            }
        }
    }
    let interior_area = iw as u64 * ih as u64;
    if interior_area > 0 {
        report.occupancy = (used_area as f64 / interior_area as f64) as f32;
    }
    report
}

fn reset_all(sprites: &mut [SpriteRecord]) {
    for sprite in sprites.iter_mut() {
        sprite.reset_for_packing();
    }
}
