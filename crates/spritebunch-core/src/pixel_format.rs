//! Pixel formats for the written sheet image.
//!
//! The sheet is always composed as RGBA8. Lower-precision formats are emulated by
//! quantizing each channel to the target bit depth, so the PNG on disk carries exactly
//! the colours a GPU texture in that format would hold.

use crate::error::BuncherError;
use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Storage format of the sheet image.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SheetPixelFormat {
    #[default]
    Rgba8888,
    Rgba8888Premultiplied,
    Rgba4444Premultiplied,
    Rgb888,
    Rgb565,
    /// 8-bit alpha with 5/6/5 premultiplied colour.
    Rgb565Premultiplied,
    Rgb555,
}

impl SheetPixelFormat {
    pub const ALL: [SheetPixelFormat; 7] = [
        SheetPixelFormat::Rgba8888,
        SheetPixelFormat::Rgba8888Premultiplied,
        SheetPixelFormat::Rgba4444Premultiplied,
        SheetPixelFormat::Rgb888,
        SheetPixelFormat::Rgb565,
        SheetPixelFormat::Rgb565Premultiplied,
        SheetPixelFormat::Rgb555,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SheetPixelFormat::Rgba8888 => "RGBA8888",
            SheetPixelFormat::Rgba8888Premultiplied => "RGBA8888 premultiplied alpha",
            SheetPixelFormat::Rgba4444Premultiplied => "RGBA4444 premultiplied alpha",
            SheetPixelFormat::Rgb888 => "RGB888 (no alpha)",
            SheetPixelFormat::Rgb565 => "RGB565 (no alpha)",
            SheetPixelFormat::Rgb565Premultiplied => "RGB565 premultiplied alpha",
            SheetPixelFormat::Rgb555 => "RGB555 (no alpha)",
        }
    }

    /// Short identifier accepted by `FromStr`.
    pub fn id(self) -> &'static str {
        match self {
            SheetPixelFormat::Rgba8888 => "rgba8888",
            SheetPixelFormat::Rgba8888Premultiplied => "rgba8888_pm",
            SheetPixelFormat::Rgba4444Premultiplied => "rgba4444_pm",
            SheetPixelFormat::Rgb888 => "rgb888",
            SheetPixelFormat::Rgb565 => "rgb565",
            SheetPixelFormat::Rgb565Premultiplied => "rgb565_pm",
            SheetPixelFormat::Rgb555 => "rgb555",
        }
    }

    /// Position in the numeric table stored as `imgformat` in per-folder settings.
    pub fn settings_index(self) -> u32 {
        match self {
            SheetPixelFormat::Rgba8888 => 0,
            SheetPixelFormat::Rgba8888Premultiplied => 1,
            SheetPixelFormat::Rgba4444Premultiplied => 2,
            SheetPixelFormat::Rgb888 => 3,
            SheetPixelFormat::Rgb565 => 4,
            SheetPixelFormat::Rgb565Premultiplied => 5,
            SheetPixelFormat::Rgb555 => 6,
        }
    }

    /// Inverse of [`SheetPixelFormat::settings_index`].
    pub fn from_settings_index(index: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.settings_index() == index)
    }

    pub fn has_alpha(self) -> bool {
        !matches!(
            self,
            SheetPixelFormat::Rgb888 | SheetPixelFormat::Rgb565 | SheetPixelFormat::Rgb555
        )
    }

    /// Converts a composed sheet into this format, ready to be saved.
    ///
    /// Formats without alpha drop the alpha channel. Premultiplied formats are
    /// written back straight (un-premultiplied), with the precision loss of the
    /// premultiplied storage; fully transparent pixels become `(0, 0, 0, 0)`.
    pub fn convert(self, sheet: RgbaImage) -> DynamicImage {
        match self {
            SheetPixelFormat::Rgba8888 => DynamicImage::ImageRgba8(sheet),
            SheetPixelFormat::Rgba8888Premultiplied => {
                DynamicImage::ImageRgba8(through_premultiplied(sheet, 8, [8, 8, 8]))
            }
            SheetPixelFormat::Rgba4444Premultiplied => {
                DynamicImage::ImageRgba8(through_premultiplied(sheet, 4, [4, 4, 4]))
            }
            SheetPixelFormat::Rgb565Premultiplied => {
                DynamicImage::ImageRgba8(through_premultiplied(sheet, 8, [5, 6, 5]))
            }
            SheetPixelFormat::Rgb888 => opaque(sheet, [8, 8, 8]),
            SheetPixelFormat::Rgb565 => opaque(sheet, [5, 6, 5]),
            SheetPixelFormat::Rgb555 => opaque(sheet, [5, 5, 5]),
        }
    }
}

impl FromStr for SheetPixelFormat {
    type Err = BuncherError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "rgba8888" | "rgba8" | "argb32" => Ok(Self::Rgba8888),
            "rgba8888_pm" | "rgba8888_premultiplied" => Ok(Self::Rgba8888Premultiplied),
            "rgba4444_pm" | "rgba4444" | "rgba4444_premultiplied" => {
                Ok(Self::Rgba4444Premultiplied)
            }
            "rgb888" | "rgb8" => Ok(Self::Rgb888),
            "rgb565" | "rgb16" => Ok(Self::Rgb565),
            "rgb565_pm" | "rgb565_premultiplied" => Ok(Self::Rgb565Premultiplied),
            "rgb555" => Ok(Self::Rgb555),
            other => Err(BuncherError::UnknownFormat(other.to_string())),
        }
    }
}

/// Keeps the top `bits` of `v` and widens back to 8 bits by bit replication.
/// `bits` must be in `4..=8`.
pub(crate) fn quantize(v: u8, bits: u8) -> u8 {
    if bits >= 8 {
        return v;
    }
    let q = v >> (8 - bits);
    (q << (8 - bits)) | (q >> (2 * bits - 8))
}

fn through_premultiplied(mut img: RgbaImage, alpha_bits: u8, color_bits: [u8; 3]) -> RgbaImage {
    for p in img.pixels_mut() {
        let a = quantize(p[3], alpha_bits);
        if a == 0 {
            *p = Rgba([0, 0, 0, 0]);
            continue;
        }
        let a32 = a as u32;
        for (c, bits) in p.0[..3].iter_mut().zip(color_bits) {
            let stored = quantize(((*c as u32 * a32 + 127) / 255) as u8, bits);
            *c = ((stored as u32 * 255 + a32 / 2) / a32).min(255) as u8;
        }
        p[3] = a;
    }
    img
}

fn opaque(img: RgbaImage, color_bits: [u8; 3]) -> DynamicImage {
    let mut rgb = DynamicImage::ImageRgba8(img).to_rgb8();
    if color_bits != [8, 8, 8] {
        for p in rgb.pixels_mut() {
            for (c, bits) in p.0.iter_mut().zip(color_bits) {
                *c = quantize(*c, bits);
            }
        }
    }
    DynamicImage::ImageRgb8(rgb)
}
