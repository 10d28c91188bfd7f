use crate::config::{SheetConfig, SortOrder};
use crate::error::Result;
use crate::model::Rect;
use crate::preprocess;
use image::{DynamicImage, ImageReader, RgbaImage};
use std::path::Path;
use std::sync::Arc;

/// One source image plus its placement state on the sheet.
///
/// `original` is fixed at construction. `current` is the working copy produced by
/// preprocessing; it is always replaced wholesale, never edited in place.
#[derive(Debug, Clone)]
pub struct SpriteRecord {
    file_name: String,
    original: Arc<RgbaImage>,
    current: RgbaImage,
    packed_rect: Rect,
    rotated: bool,
    cropped: bool,
    expanded: bool,
    scaled: bool,
}

impl SpriteRecord {
    pub fn new(file_name: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            file_name: file_name.into(),
            current: image.clone(),
            original: Arc::new(image),
            packed_rect: Rect::default(),
            rotated: false,
            cropped: false,
            expanded: false,
            scaled: false,
        }
    }

    pub fn from_dynamic(file_name: impl Into<String>, image: DynamicImage) -> Self {
        Self::new(file_name, image.to_rgba8())
    }

    /// Decodes the image at `path` (format guessed from its contents) and records it
    /// under `file_name`.
    pub fn open(path: impl AsRef<Path>, file_name: impl Into<String>) -> Result<Self> {
        let image = ImageReader::open(path.as_ref())?
            .with_guessed_format()?
            .decode()?;
        Ok(Self::from_dynamic(file_name, image))
    }

    /// File name including extension, as written to most atlas formats.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name up to its first `.`, as used by LibGDX region names.
    pub fn base_name(&self) -> &str {
        match self.file_name.find('.') {
            Some(i) => &self.file_name[..i],
            None => &self.file_name,
        }
    }

    pub fn original(&self) -> &RgbaImage {
        &self.original
    }

    pub fn current(&self) -> &RgbaImage {
        &self.current
    }

    /// True when the working image has no pixels and can never be packed.
    pub fn is_empty(&self) -> bool {
        self.current.width() == 0 || self.current.height() == 0
    }

    /// Placement in packer-interior space, padding included. All-zero when not placed.
    pub fn packed_rect(&self) -> Rect {
        self.packed_rect
    }

    pub fn set_packed_rect(&mut self, rect: Rect) {
        self.packed_rect = rect;
    }

    pub fn is_packed(&self) -> bool {
        self.packed_rect.h > 0 && self.packed_rect.w > 0
    }

    pub fn is_rotated(&self) -> bool {
        self.rotated
    }

    pub fn set_rotated(&mut self, rotated: bool) {
        self.rotated = rotated;
    }

    pub fn is_cropped(&self) -> bool {
        self.cropped
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_scaled(&self) -> bool {
        self.scaled
    }

    /// Clears placement, rotation and provenance, and restores the original image.
    pub fn reset_for_packing(&mut self) {
        self.packed_rect = Rect::default();
        self.rotated = false;
        self.restore_original();
    }

    /// Reverts to the original image, dropping any crop/expand/scale result.
    pub fn restore_original(&mut self) {
        self.current = RgbaImage::clone(&self.original);
        self.cropped = false;
        self.expanded = false;
        self.scaled = false;
    }

    /// Crops the working image to its opaque bounds.
    pub fn crop(&mut self) {
        if let Some(img) = preprocess::crop(&self.current) {
            self.current = img;
            self.cropped = true;
        }
    }

    /// Grows the working image by `n` transparent pixels on each side.
    pub fn expand(&mut self, n: u32) {
        if let Some(img) = preprocess::expand(&self.current, n) {
            self.current = img;
            self.expanded = true;
        }
    }

    pub fn scale(&mut self, factor: f32) {
        if let Some(img) = preprocess::scale(&self.current, factor) {
            self.current = img;
            self.scaled = true;
        }
    }

    /// Sheet-space rectangle of the visible sprite.
    ///
    /// The packed box carries the padding once, so it is added once to the position
    /// (together with the border) and subtracted once from the size.
    pub fn export_rect(&self, sheet: &SheetConfig) -> Rect {
        let r = self.packed_rect;
        let offset = sheet.border.saturating_add(sheet.padding);
        Rect::new(
            r.x.saturating_add(offset),
            r.y.saturating_add(offset),
            r.w.saturating_sub(sheet.padding),
            r.h.saturating_sub(sheet.padding),
        )
    }
}

/// Stable sort of the input list. Ties fall back to file name so the result does not
/// depend on how the list was produced.
pub fn sort_sprites(sprites: &mut [SpriteRecord], order: SortOrder) {
    let dims = |s: &SpriteRecord| s.original().dimensions();
    match order {
        SortOrder::None => {}
        SortOrder::NameAsc => sprites.sort_by(|a, b| a.file_name.cmp(&b.file_name)),
        SortOrder::AreaDesc => sprites.sort_by(|a, b| {
            let (aw, ah) = dims(a);
            let (bw, bh) = dims(b);
            (bw as u64 * bh as u64)
                .cmp(&(aw as u64 * ah as u64))
                .then_with(|| a.file_name.cmp(&b.file_name))
        }),
        SortOrder::WidthDesc => sprites.sort_by(|a, b| {
            dims(b)
                .0
                .cmp(&dims(a).0)
                .then_with(|| a.file_name.cmp(&b.file_name))
        }),
        SortOrder::HeightDesc => sprites.sort_by(|a, b| {
            dims(b)
                .1
                .cmp(&dims(a).1)
                .then_with(|| a.file_name.cmp(&b.file_name))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_stops_at_first_dot() {
        let s = SpriteRecord::new("hero.walk.png", RgbaImage::new(1, 1));
        assert_eq!(s.base_name(), "hero");
        let s = SpriteRecord::new("noext", RgbaImage::new(1, 1));
        assert_eq!(s.base_name(), "noext");
    }

    #[test]
    fn export_rect_applies_border_and_padding_once() {
        let mut s = SpriteRecord::new("a.png", RgbaImage::new(10, 20));
        s.set_packed_rect(Rect::new(4, 6, 12, 22));
        let sheet = SheetConfig::new(128, 128).with_padding(2).with_border(3);
        assert_eq!(s.export_rect(&sheet), Rect::new(9, 11, 10, 20));
    }
}
