use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Placement strategy families.
///   - `MaxRects` drives a free-rectangle bin with one of the [`MaxRectsHeuristic`] rules
///   - `Rows` is the deterministic shelf packer (no rotation)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackMethod {
    MaxRects,
    Rows,
}

impl FromStr for PackMethod {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maxrects" => Ok(Self::MaxRects),
            "rows" | "shelf" => Ok(Self::Rows),
            _ => Err(()),
        }
    }
}

/// MaxRects placement heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    BestAreaFit,
    BestShortSideFit,
    BestLongSideFit,
    BottomLeft,
    ContactPoint,
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "cp" | "contactpoint" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// Input orderings applied before layout. The layout engine itself never reorders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    AreaDesc,
    NameAsc,
    WidthDesc,
    HeightDesc,
    None,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "area_desc" => Ok(Self::AreaDesc),
            "name_asc" => Ok(Self::NameAsc),
            "width_desc" => Ok(Self::WidthDesc),
            "height_desc" => Ok(Self::HeightDesc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Sheet canvas and spacing.
///
/// The packable interior is `(width - 2*border, height - 2*border)`; packers work in
/// interior space and the border is added back only when exporting or rendering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Pixel gap reserved with every sprite's packed box.
    #[serde(default)]
    pub padding: u32,
    /// Pixel margin around the packable interior.
    #[serde(default)]
    pub border: u32,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            padding: 1,
            border: 0,
        }
    }
}

impl SheetConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            padding: 0,
            border: 0,
        }
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_border(mut self, border: u32) -> Self {
        self.border = border;
        self
    }

    /// Interior (packable) size after removing the border on every side.
    pub fn interior(&self) -> (u32, u32) {
        let total = self.border.saturating_mul(2);
        (
            self.width.saturating_sub(total),
            self.height.saturating_sub(total),
        )
    }

    /// Validates the sheet parameters.
    ///
    /// Returns an error if:
    /// - Dimensions are zero
    /// - The border leaves no packable interior
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::BuncherError;

        if self.width == 0 || self.height == 0 {
            return Err(BuncherError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let total_border = self.border.saturating_mul(2);
        if total_border >= self.width || total_border >= self.height {
            return Err(BuncherError::InvalidConfig(format!(
                "border ({}) * 2 leaves no interior in a {}x{} sheet",
                self.border, self.width, self.height
            )));
        }

        Ok(())
    }
}

/// Strategy selection and per-sprite preprocessing for one layout run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutOptions {
    #[serde(default = "default_method")]
    pub method: PackMethod,
    #[serde(default = "default_heuristic")]
    pub heuristic: MaxRectsHeuristic,
    /// Let the free-rectangle packer turn sprites 90°. Ignored by `Rows`.
    #[serde(default)]
    pub allow_rotation: bool,
    /// Crop every sprite to its opaque bounds before packing.
    #[serde(default)]
    pub crop: bool,
    /// Transparent pixels added on every side of each sprite.
    #[serde(default)]
    pub expand: u32,
    /// Edge pixels duplicated outward when the sheet is rendered.
    #[serde(default)]
    pub extrude: u32,
    /// Uniform sprite scale factor (sheet size is unaffected).
    #[serde(default = "default_scale")]
    pub scale: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            method: default_method(),
            heuristic: default_heuristic(),
            allow_rotation: false,
            crop: false,
            expand: 0,
            extrude: 0,
            scale: default_scale(),
        }
    }
}

impl LayoutOptions {
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(crate::error::BuncherError::InvalidConfig(format!(
                "scale must be a positive finite number, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    /// Rejects an `expand` margin that alone leaves no room on the sheet interior.
    pub fn validate_for(&self, sheet: &SheetConfig) -> crate::error::Result<()> {
        let (iw, ih) = sheet.interior();
        let margin = self.expand as u64 * 2;
        if self.expand > 0 && (margin >= iw as u64 || margin >= ih as u64) {
            return Err(crate::error::BuncherError::InvalidConfig(format!(
                "expand ({}) * 2 does not fit the {iw}x{ih} interior",
                self.expand
            )));
        }
        Ok(())
    }

    /// Create a fluent builder for `LayoutOptions`.
    pub fn builder() -> LayoutOptionsBuilder {
        LayoutOptionsBuilder::new()
    }
}

fn default_method() -> PackMethod {
    PackMethod::MaxRects
}
fn default_heuristic() -> MaxRectsHeuristic {
    MaxRectsHeuristic::BestAreaFit
}
fn default_scale() -> f32 {
    1.0
}

/// Builder for `LayoutOptions` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct LayoutOptionsBuilder {
    opts: LayoutOptions,
}

impl LayoutOptionsBuilder {
    pub fn new() -> Self {
        Self {
            opts: LayoutOptions::default(),
        }
    }
    pub fn method(mut self, v: PackMethod) -> Self {
        self.opts.method = v;
        self
    }
    pub fn heuristic(mut self, v: MaxRectsHeuristic) -> Self {
        self.opts.heuristic = v;
        self
    }
    pub fn allow_rotation(mut self, v: bool) -> Self {
        self.opts.allow_rotation = v;
        self
    }
    pub fn crop(mut self, v: bool) -> Self {
        self.opts.crop = v;
        self
    }
    pub fn expand(mut self, v: u32) -> Self {
        self.opts.expand = v;
        self
    }
    pub fn extrude(mut self, v: u32) -> Self {
        self.opts.extrude = v;
        self
    }
    pub fn scale(mut self, v: f32) -> Self {
        self.opts.scale = v;
        self
    }
    pub fn build(self) -> LayoutOptions {
        self.opts
    }
}
