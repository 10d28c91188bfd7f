//! Per-sprite image transforms applied before packing.
//!
//! Every transform returns a new image and leaves its input untouched, so a sprite's
//! original pixels survive any number of layout runs. The fixed order is
//! crop, then expand, then scale.

use crate::config::LayoutOptions;
use crate::model::Rect;
use crate::sprite::SpriteRecord;
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Fractional pixel remainder above which a scaled dimension is rounded up.
pub const SCALE_ROUND_UP_THRESHOLD: f64 = 0.1;

/// Minimal rectangle enclosing every pixel with alpha above zero.
///
/// Returns `None` for empty or fully transparent images.
pub fn opaque_bounds(rgba: &RgbaImage) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let column_clear = |x: u32, y1: u32, y2: u32| (y1..=y2).all(|y| rgba.get_pixel(x, y)[3] == 0);
    let row_clear = |y: u32, x1: u32, x2: u32| (x1..=x2).all(|x| rgba.get_pixel(x, y)[3] == 0);

    let mut x1 = 0;
    while x1 < w && column_clear(x1, 0, h - 1) {
        x1 += 1;
    }
    if x1 >= w {
        return None;
    }
    let mut x2 = w - 1;
    while x2 > x1 && column_clear(x2, 0, h - 1) {
        x2 -= 1;
    }
    let mut y1 = 0;
    while y1 < h && row_clear(y1, x1, x2) {
        y1 += 1;
    }
    let mut y2 = h - 1;
    while y2 > y1 && row_clear(y2, x1, x2) {
        y2 -= 1;
    }
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}

/// Crops to the opaque bounds. `None` when the image is empty, fully transparent,
/// or already tight on both axes.
pub fn crop(rgba: &RgbaImage) -> Option<RgbaImage> {
    let (w, h) = rgba.dimensions();
    let b = opaque_bounds(rgba)?;
    if b.w < w || b.h < h {
        Some(imageops::crop_imm(rgba, b.x, b.y, b.w, b.h).to_image())
    } else {
        None
    }
}

/// New transparent image `2n` larger on each axis with `rgba` centred in it.
///
/// `None` when `n` is zero, the image is empty, or the grown image would not be
/// addressable.
pub fn expand(rgba: &RgbaImage, n: u32) -> Option<RgbaImage> {
    let (w, h) = rgba.dimensions();
    if n == 0 || w == 0 || h == 0 {
        return None;
    }
    let grow = n.checked_mul(2)?;
    let nw = w.checked_add(grow)?;
    let nh = h.checked_add(grow)?;
    let bytes = (nw as u64).checked_mul(nh as u64)?.checked_mul(4)?;
    usize::try_from(bytes).ok()?;
    let mut canvas = RgbaImage::new(nw, nh);
    imageops::replace(&mut canvas, rgba, n as i64, n as i64);
    Some(canvas)
}

/// Target size of one axis after scaling by `factor`.
///
/// Truncates, except that a remainder above [`SCALE_ROUND_UP_THRESHOLD`] rounds up so
/// partially covered edge pixels are kept. Never returns less than 1.
pub fn scaled_dimension(d: u32, factor: f32) -> u32 {
    let exact = d as f64 * factor as f64;
    let mut n = exact.floor();
    if exact - n > SCALE_ROUND_UP_THRESHOLD {
        n += 1.0;
    }
    (n as u32).max(1)
}

/// Resizes with a smooth (triangle) filter. `None` when the integer size would not change.
pub fn scale(rgba: &RgbaImage, factor: f32) -> Option<RgbaImage> {
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 || !factor.is_finite() || factor <= 0.0 {
        return None;
    }
    let nw = scaled_dimension(w, factor);
    let nh = scaled_dimension(h, factor);
    if nw == w && nh == h {
        return None;
    }
    Some(imageops::resize(rgba, nw, nh, FilterType::Triangle))
}

/// The preprocessing stages requested for a layout run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocess {
    pub crop: bool,
    pub expand: u32,
    pub scale: f32,
}

impl Default for Preprocess {
    fn default() -> Self {
        Self {
            crop: false,
            expand: 0,
            scale: 1.0,
        }
    }
}

impl From<&LayoutOptions> for Preprocess {
    fn from(opts: &LayoutOptions) -> Self {
        Self {
            crop: opts.crop,
            expand: opts.expand,
            scale: opts.scale,
        }
    }
}

impl Preprocess {
    /// Applies crop, expand and scale (in that order) to the sprite's working image.
    pub fn apply(&self, sprite: &mut SpriteRecord) {
        if self.crop {
            sprite.crop();
        }
        if self.expand > 0 {
            sprite.expand(self.expand);
        }
        if self.scale != 1.0 {
            sprite.scale(self.scale);
        }
    }
}
