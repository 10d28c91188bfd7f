use crate::config::SheetConfig;
use crate::sprite::SpriteRecord;
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Blit `src` into `canvas` with its top-left at (dx, dy), optionally rotated 90°
/// clockwise, then extrude the outermost content pixels `extrude` pixels outward.
///
/// Writes outside the canvas are dropped.
pub fn blit_rgba(
    src: &RgbaImage,
    canvas: &mut RgbaImage,
    dx: u32,
    dy: u32,
    rotated: bool,
    extrude: u32,
) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 {
        return;
    }
    // destination (rendered) size differs when rotated
    let (rw, rh) = if rotated { (sh, sw) } else { (sw, sh) };
    let sample = |xx: u32, yy: u32| -> Rgba<u8> {
        if rotated {
            *src.get_pixel(yy, sh - 1 - xx)
        } else {
            *src.get_pixel(xx, yy)
        }
    };

    // main blit
    for yy in 0..rh {
        for xx in 0..rw {
            if dx + xx < cw && dy + yy < ch {
                canvas.put_pixel(dx + xx, dy + yy, sample(xx, yy));
            }
        }
    }

    if extrude == 0 {
        return;
    }
    // every ring pixel copies the nearest content pixel (edges and corners alike)
    let e = extrude as i64;
    for oy in -e..(rh as i64 + e) {
        for ox in -e..(rw as i64 + e) {
            let inside = ox >= 0 && oy >= 0 && ox < rw as i64 && oy < rh as i64;
            if inside {
                continue;
            }
            let tx = dx as i64 + ox;
            let ty = dy as i64 + oy;
            if tx < 0 || ty < 0 || tx >= cw as i64 || ty >= ch as i64 {
                continue;
            }
            let cx = ox.clamp(0, rw as i64 - 1) as u32;
            let cy = oy.clamp(0, rh as i64 - 1) as u32;
            canvas.put_pixel(tx as u32, ty as u32, sample(cx, cy));
        }
    }
}

/// Renders the full sheet: a transparent `width x height` canvas with every placed
/// sprite drawn at its exported position.
///
/// Extrusion is limited to half the padding so neighbouring sprites never bleed into
/// each other; sprites that failed to pack are skipped.
pub fn render_sheet(sheet: &SheetConfig, sprites: &[SpriteRecord], extrude: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(sheet.width, sheet.height);
    let extrude = effective_extrude(sheet, extrude);
    for sprite in sprites.iter().filter(|s| s.is_packed()) {
        let r = sprite.export_rect(sheet);
        blit_rgba(
            sprite.current(),
            &mut canvas,
            r.x,
            r.y,
            sprite.is_rotated(),
            extrude,
        );
    }
    debug!(
        width = sheet.width,
        height = sheet.height,
        extrude,
        "sheet rendered"
    );
    canvas
}

/// Extrusion actually applied for `requested` pixels on this sheet.
pub fn effective_extrude(sheet: &SheetConfig, requested: u32) -> u32 {
    requested.min(sheet.padding / 2)
}
