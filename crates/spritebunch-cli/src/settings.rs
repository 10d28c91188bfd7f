//! Run configuration and the per-folder `buncher.data` settings file.
//!
//! Layering, lowest to highest: built-in defaults, `buncher.data` from the output
//! folder, the `--config` YAML file, explicit command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use spritebunch_core::{
    AtlasFormat, LayoutOptions, MaxRectsHeuristic, PackMethod, SheetConfig, SheetPixelFormat,
    SortOrder,
};
use tracing::{debug, info, warn};

/// File name of the settings file kept next to the exported sheet.
pub const SETTINGS_FILE: &str = "buncher.data";
/// Output folder created inside the input folder when `--out-dir` is not given.
pub const DEFAULT_OUT_DIR: &str = "buncher";

/// Fully merged configuration for one `pack` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub sheet: SheetConfig,
    pub layout: LayoutOptions,
    /// Input ordering; `None` picks the default for the packing method.
    pub sort_order: Option<SortOrder>,
    pub format: AtlasFormat,
    /// Storage format of the sheet PNG.
    #[serde(default)]
    pub pixel_format: SheetPixelFormat,
    /// Base name of the exported files (`<name>.png`, `<name>.<ext>`).
    pub name: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sheet: SheetConfig::new(512, 512).with_padding(2).with_border(2),
            layout: LayoutOptions::default(),
            sort_order: None,
            format: AtlasFormat::Json,
            pixel_format: SheetPixelFormat::Rgba8888,
            name: "sheet".into(),
        }
    }
}

impl RunConfig {
    /// Area first for MaxRects, file name for rows.
    pub fn effective_sort(&self) -> SortOrder {
        self.sort_order.unwrap_or(match self.layout.method {
            PackMethod::MaxRects => SortOrder::AreaDesc,
            PackMethod::Rows => SortOrder::NameAsc,
        })
    }
}

/// Methods as numbered in `buncher.data`: five MaxRects heuristics followed by four
/// row orderings.
const METHOD_TABLE: [(PackMethod, MaxRectsHeuristic, SortOrder); 9] = [
    (PackMethod::MaxRects, MaxRectsHeuristic::BestAreaFit, SortOrder::AreaDesc),
    (PackMethod::MaxRects, MaxRectsHeuristic::BestShortSideFit, SortOrder::AreaDesc),
    (PackMethod::MaxRects, MaxRectsHeuristic::BestLongSideFit, SortOrder::AreaDesc),
    (PackMethod::MaxRects, MaxRectsHeuristic::BottomLeft, SortOrder::AreaDesc),
    (PackMethod::MaxRects, MaxRectsHeuristic::ContactPoint, SortOrder::AreaDesc),
    (PackMethod::Rows, MaxRectsHeuristic::BestAreaFit, SortOrder::NameAsc),
    (PackMethod::Rows, MaxRectsHeuristic::BestAreaFit, SortOrder::AreaDesc),
    (PackMethod::Rows, MaxRectsHeuristic::BestAreaFit, SortOrder::HeightDesc),
    (PackMethod::Rows, MaxRectsHeuristic::BestAreaFit, SortOrder::WidthDesc),
];

fn method_from_index(index: i64) -> Option<(PackMethod, MaxRectsHeuristic, SortOrder)> {
    usize::try_from(index).ok().and_then(|i| METHOD_TABLE.get(i).copied())
}

fn method_index(cfg: &RunConfig) -> i64 {
    match cfg.layout.method {
        PackMethod::MaxRects => match cfg.layout.heuristic {
            MaxRectsHeuristic::BestAreaFit => 0,
            MaxRectsHeuristic::BestShortSideFit => 1,
            MaxRectsHeuristic::BestLongSideFit => 2,
            MaxRectsHeuristic::BottomLeft => 3,
            MaxRectsHeuristic::ContactPoint => 4,
        },
        PackMethod::Rows => match cfg.effective_sort() {
            SortOrder::NameAsc | SortOrder::None => 5,
            SortOrder::AreaDesc => 6,
            SortOrder::HeightDesc => 7,
            SortOrder::WidthDesc => 8,
        },
    }
}

/// Contents of `buncher.data`. Every key is optional; absent or out-of-range values
/// leave the lower layer untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheetw: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheeth: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extrude: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<i64>,
    /// Sheet pixel format index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imgformat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cropping: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basename: Option<String>,
    /// Version of the application that wrote the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

fn positive(v: Option<i64>) -> Option<u32> {
    v.filter(|v| *v > 0).and_then(|v| u32::try_from(v).ok())
}

fn non_negative(v: Option<i64>) -> Option<u32> {
    v.filter(|v| *v >= 0).and_then(|v| u32::try_from(v).ok())
}

impl LegacySettings {
    /// Reads `dir/buncher.data`. `Ok(None)` when the file does not exist.
    pub fn load(dir: &Path) -> anyhow::Result<Option<Self>> {
        let path = dir.join(SETTINGS_FILE);
        if !path.is_file() {
            debug!(?path, "no settings file");
            return Ok(None);
        }
        let text =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let settings: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse settings {}", path.display()))?;
        debug!(?path, version = settings.version.as_deref().unwrap_or("?"), "settings loaded");
        Ok(Some(settings))
    }

    /// Writes the settings as pretty JSON to `dir/buncher.data`, replacing any old file.
    pub fn save(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let path = dir.join(SETTINGS_FILE);
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
        info!(?path, "settings saved");
        Ok(path)
    }

    pub fn from_run_config(cfg: &RunConfig) -> Self {
        Self {
            sheetw: Some(cfg.sheet.width.into()),
            sheeth: Some(cfg.sheet.height.into()),
            padding: Some(cfg.sheet.padding.into()),
            border: Some(cfg.sheet.border.into()),
            expand: Some(cfg.layout.expand.into()),
            extrude: Some(cfg.layout.extrude.into()),
            method: Some(method_index(cfg)),
            format: Some(cfg.format.settings_index().into()),
            imgformat: Some(cfg.pixel_format.settings_index().into()),
            rotation: Some(cfg.layout.allow_rotation),
            cropping: Some(cfg.layout.crop),
            basename: Some(cfg.name.clone()),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    /// Overlays the stored values on `cfg`.
    pub fn apply(&self, cfg: &mut RunConfig) {
        if let Some(v) = positive(self.sheetw) {
            cfg.sheet.width = v;
        }
        if let Some(v) = positive(self.sheeth) {
            cfg.sheet.height = v;
        }
        if let Some(v) = non_negative(self.padding) {
            cfg.sheet.padding = v;
        }
        if let Some(v) = non_negative(self.border) {
            cfg.sheet.border = v;
        }
        if let Some(v) = non_negative(self.expand) {
            cfg.layout.expand = v;
        }
        if let Some(v) = non_negative(self.extrude) {
            cfg.layout.extrude = v;
        }
        if let Some(index) = self.method {
            match method_from_index(index) {
                Some((method, heuristic, sort)) => {
                    cfg.layout.method = method;
                    cfg.layout.heuristic = heuristic;
                    cfg.sort_order = Some(sort);
                }
                None => warn!(index, "unknown packing method in settings file"),
            }
        }
        if let Some(index) = self.format {
            match u32::try_from(index).ok().and_then(AtlasFormat::from_settings_index) {
                Some(format) => cfg.format = format,
                None => warn!(index, "unknown export format in settings file"),
            }
        }
        if let Some(index) = self.imgformat {
            match u32::try_from(index).ok().and_then(SheetPixelFormat::from_settings_index) {
                Some(format) => cfg.pixel_format = format,
                None => warn!(index, "unknown image format in settings file"),
            }
        }
        if let Some(v) = self.rotation {
            cfg.layout.allow_rotation = v;
        }
        if let Some(v) = self.cropping {
            cfg.layout.crop = v;
        }
        if let Some(v) = self.basename.as_ref().filter(|s| !s.is_empty()) {
            cfg.name = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_keys_written_by_older_versions() {
        let text = r#"{
            "sheetw": 1024, "sheeth": 256, "padding": 0, "border": 4,
            "expand": 1, "extrude": 2, "method": 7, "format": 2,
            "imgformat": 0, "rotation": true, "cropping": true,
            "basename": "ui", "version": "1.0.3"
        }"#;
        let s: LegacySettings = serde_json::from_str(text).expect("parse");
        let mut cfg = RunConfig::default();
        s.apply(&mut cfg);
        assert_eq!(cfg.sheet, SheetConfig::new(1024, 256).with_border(4));
        assert_eq!(cfg.layout.expand, 1);
        assert_eq!(cfg.layout.extrude, 2);
        assert_eq!(cfg.layout.method, PackMethod::Rows);
        assert_eq!(cfg.effective_sort(), SortOrder::HeightDesc);
        assert_eq!(cfg.format, AtlasFormat::LibGdx);
        assert_eq!(cfg.pixel_format, SheetPixelFormat::Rgba8888);
        assert!(cfg.layout.allow_rotation);
        assert!(cfg.layout.crop);
        assert_eq!(cfg.name, "ui");
    }

    #[test]
    fn out_of_range_values_are_ignored() {
        let s = LegacySettings {
            sheetw: Some(0),
            padding: Some(-3),
            method: Some(42),
            format: Some(-1),
            imgformat: Some(7),
            basename: Some(String::new()),
            ..Default::default()
        };
        let mut cfg = RunConfig::default();
        s.apply(&mut cfg);
        assert_eq!(cfg, RunConfig::default());
    }

    #[test]
    fn method_index_survives_a_save_cycle() {
        for index in 0..METHOD_TABLE.len() as i64 {
            let mut cfg = RunConfig::default();
            LegacySettings {
                method: Some(index),
                ..Default::default()
            }
            .apply(&mut cfg);
            assert_eq!(LegacySettings::from_run_config(&cfg).method, Some(index));
        }
    }

    #[test]
    fn save_then_load_restores_the_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = RunConfig::default();
        cfg.sheet = SheetConfig::new(300, 200).with_padding(3).with_border(1);
        cfg.layout.heuristic = MaxRectsHeuristic::ContactPoint;
        cfg.layout.allow_rotation = true;
        cfg.format = AtlasFormat::Cocos2dPlist;
        cfg.name = "atlas".into();
        LegacySettings::from_run_config(&cfg)
            .save(dir.path())
            .expect("save");

        let loaded = LegacySettings::load(dir.path()).expect("load").expect("present");
        assert_eq!(loaded.version.as_deref(), Some(env!("CARGO_PKG_VERSION")));
        let mut restored = RunConfig::default();
        loaded.apply(&mut restored);
        assert_eq!(restored.sheet, cfg.sheet);
        assert_eq!(restored.layout.heuristic, MaxRectsHeuristic::ContactPoint);
        assert!(restored.layout.allow_rotation);
        assert_eq!(restored.format, AtlasFormat::Cocos2dPlist);
        assert_eq!(restored.name, "atlas");
        assert_eq!(restored.effective_sort(), SortOrder::AreaDesc);
    }

    #[test]
    fn image_format_survives_load_and_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"imgformat": 3, "format": 1}"#,
        )
        .expect("write");
        let mut cfg = RunConfig::default();
        LegacySettings::load(dir.path())
            .expect("load")
            .expect("present")
            .apply(&mut cfg);
        assert_eq!(cfg.pixel_format, SheetPixelFormat::Rgb888);

        LegacySettings::from_run_config(&cfg)
            .save(dir.path())
            .expect("save");
        let saved = LegacySettings::load(dir.path()).expect("load").expect("present");
        assert_eq!(saved.imgformat, Some(3));
        assert_eq!(saved.format, Some(1));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(LegacySettings::load(dir.path()).expect("load").is_none());
    }

    #[test]
    fn default_sort_follows_the_method() {
        let mut cfg = RunConfig::default();
        assert_eq!(cfg.effective_sort(), SortOrder::AreaDesc);
        cfg.layout.method = PackMethod::Rows;
        assert_eq!(cfg.effective_sort(), SortOrder::NameAsc);
        cfg.sort_order = Some(SortOrder::None);
        assert_eq!(cfg.effective_sort(), SortOrder::None);
    }
}
