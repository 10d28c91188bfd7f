use crate::config::SheetConfig;
use crate::export::PIXEL_FORMAT;
use crate::sprite::SpriteRecord;
use std::fmt::Write;

/// LibGDX texture atlas (`.atlas`). Region names drop the file extension.
///
/// Regions are always written with `rotate: false`.
pub fn to_libgdx(sheet: &SheetConfig, name: &str, sprites: &[SpriteRecord]) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "{}.png", name);
    let _ = writeln!(s, "format: {}", PIXEL_FORMAT);
    s.push_str("filter: Linear,Linear\n");
    s.push_str("repeat: none\n");
    for sprite in sprites.iter().filter(|s| s.is_packed()) {
        let r = sprite.export_rect(sheet);
        let _ = writeln!(s, "{}", sprite.base_name());
        s.push_str("  rotate: false\n");
        let _ = writeln!(s, "  xy: {}, {}", r.x, r.y);
        let _ = writeln!(s, "  size: {}, {}", r.w, r.h);
        let _ = writeln!(s, "  orig: {}, {}", r.w, r.h);
        s.push_str("  offset: 0, 0\n");
        s.push_str("  index: -1\n");
    }
    s
}

/// One tab-separated line per sprite; `rotated` is `1` or `0`.
pub fn to_plain_text(sheet: &SheetConfig, sprites: &[SpriteRecord]) -> String {
    let mut s = String::new();
    for sprite in sprites.iter().filter(|s| s.is_packed()) {
        let r = sprite.export_rect(sheet);
        let _ = writeln!(
            s,
            "image=\"{}\"\t x={}\t y={}\t width={}\t height={}\t rotated={}",
            sprite.file_name(),
            r.x,
            r.y,
            r.w,
            r.h,
            u8::from(sprite.is_rotated())
        );
    }
    s
}

/// Gideros TexturePack text: `name, x, y, w, h, 0, 0, 0, 0` per sprite (no trim offsets).
pub fn to_gideros(sheet: &SheetConfig, sprites: &[SpriteRecord]) -> String {
    let mut s = String::new();
    for sprite in sprites.iter().filter(|s| s.is_packed()) {
        let r = sprite.export_rect(sheet);
        let _ = writeln!(
            s,
            "{}, {}, {}, {}, {}, 0, 0, 0, 0",
            sprite.file_name(),
            r.x,
            r.y,
            r.w,
            r.h
        );
    }
    s
}
