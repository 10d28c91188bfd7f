use crate::config::SheetConfig;
use crate::error::{BuncherError, Result};
use crate::export_plist::to_cocos2d_plist;
use crate::export_text::{to_gideros, to_libgdx, to_plain_text};
use crate::export_xml::{to_generic_xml, to_sparrow_xml};
use crate::sprite::SpriteRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

pub(crate) const APP_NAME: &str = "spritebunch";
pub(crate) const PIXEL_FORMAT: &str = "RGBA8888";

/// Supported atlas metadata formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AtlasFormat {
    GenericXml,
    PlainText,
    LibGdx,
    Sparrow,
    Json,
    UnityJson,
    Gideros,
    Cocos2dPlist,
}

impl AtlasFormat {
    pub const ALL: [AtlasFormat; 8] = [
        AtlasFormat::GenericXml,
        AtlasFormat::PlainText,
        AtlasFormat::LibGdx,
        AtlasFormat::Sparrow,
        AtlasFormat::Json,
        AtlasFormat::UnityJson,
        AtlasFormat::Gideros,
        AtlasFormat::Cocos2dPlist,
    ];

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            AtlasFormat::GenericXml => "Generic XML",
            AtlasFormat::PlainText => "Plain text",
            AtlasFormat::LibGdx => "LibGDX",
            AtlasFormat::Sparrow => "Sparrow / Starling",
            AtlasFormat::Json => "JSON",
            AtlasFormat::UnityJson => "Unity3d (JSON)",
            AtlasFormat::Gideros => "Gideros",
            AtlasFormat::Cocos2dPlist => "Cocos2d (PLIST)",
        }
    }

    /// Short identifier accepted by `FromStr`.
    pub fn id(self) -> &'static str {
        match self {
            AtlasFormat::GenericXml => "xml",
            AtlasFormat::PlainText => "text",
            AtlasFormat::LibGdx => "libgdx",
            AtlasFormat::Sparrow => "sparrow",
            AtlasFormat::Json => "json",
            AtlasFormat::UnityJson => "unity",
            AtlasFormat::Gideros => "gideros",
            AtlasFormat::Cocos2dPlist => "cocos2d",
        }
    }

    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            AtlasFormat::GenericXml | AtlasFormat::Sparrow | AtlasFormat::Cocos2dPlist => ".xml",
            AtlasFormat::Json | AtlasFormat::UnityJson => ".json",
            AtlasFormat::LibGdx => ".atlas",
            AtlasFormat::PlainText | AtlasFormat::Gideros => ".txt",
        }
    }

    /// Position in the numeric format table stored in per-folder settings files.
    pub fn settings_index(self) -> u32 {
        match self {
            AtlasFormat::GenericXml => 0,
            AtlasFormat::PlainText => 1,
            AtlasFormat::LibGdx => 2,
            AtlasFormat::Sparrow => 3,
            AtlasFormat::Json => 4,
            AtlasFormat::UnityJson => 5,
            AtlasFormat::Gideros => 6,
            AtlasFormat::Cocos2dPlist => 7,
        }
    }

    /// Inverse of [`AtlasFormat::settings_index`]. `None` for indices outside the table.
    pub fn from_settings_index(index: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.settings_index() == index)
    }

    /// Serializes the placed sprites. `name` is the sheet base name (the image is `name.png`).
    pub fn render(self, sheet: &SheetConfig, name: &str, sprites: &[SpriteRecord]) -> Result<String> {
        let text = match self {
            AtlasFormat::GenericXml => to_generic_xml(sheet, name, sprites),
            AtlasFormat::Sparrow => to_sparrow_xml(sheet, name, sprites),
            AtlasFormat::Json => pretty(&to_json(sheet, name, sprites))?,
            AtlasFormat::UnityJson => pretty(&to_unity_json(sheet, name, sprites))?,
            AtlasFormat::LibGdx => to_libgdx(sheet, name, sprites),
            AtlasFormat::PlainText => to_plain_text(sheet, sprites),
            AtlasFormat::Gideros => to_gideros(sheet, sprites),
            AtlasFormat::Cocos2dPlist => to_cocos2d_plist(sheet, name, sprites),
        };
        Ok(text)
    }
}

impl FromStr for AtlasFormat {
    type Err = BuncherError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xml" | "generic_xml" | "generic-xml" => Ok(Self::GenericXml),
            "text" | "txt" | "plain" | "plain_text" => Ok(Self::PlainText),
            "libgdx" | "gdx" => Ok(Self::LibGdx),
            "sparrow" | "starling" => Ok(Self::Sparrow),
            "json" => Ok(Self::Json),
            "unity" | "unity_json" | "unity-json" => Ok(Self::UnityJson),
            "gideros" => Ok(Self::Gideros),
            "cocos2d" | "cocos" | "plist" => Ok(Self::Cocos2dPlist),
            other => Err(BuncherError::UnknownFormat(other.to_string())),
        }
    }
}

fn pretty(value: &Value) -> Result<String> {
    let mut s = serde_json::to_string_pretty(value)?;
    s.push('\n');
    Ok(s)
}

/// Renders `format` and writes it to `dir/name<ext>`, replacing any previous file.
///
/// The text is built completely before the file is touched; a failed open or write is
/// reported for this format only.
pub fn export_atlas(
    format: AtlasFormat,
    sheet: &SheetConfig,
    dir: &Path,
    name: &str,
    sprites: &[SpriteRecord],
) -> Result<PathBuf> {
    let text = format.render(sheet, name, sprites)?;
    let path = dir.join(format!("{}{}", name, format.extension()));
    debug!(?path, bytes = text.len(), format = format.id(), "writing atlas");
    fs::write(&path, text)?;
    info!(?path, format = format.display_name(), "atlas written");
    Ok(path)
}

fn frame_value(sheet: &SheetConfig, sprite: &SpriteRecord) -> Map<String, Value> {
    let r = sprite.export_rect(sheet);
    let frame = json!({"x": r.x, "y": r.y, "w": r.w, "h": r.h});
    let mut obj = Map::new();
    obj.insert("frame".into(), frame.clone());
    obj.insert("rotated".into(), json!(sprite.is_rotated()));
    // cropping is baked into the sheet, so frames are never reported as trimmed
    obj.insert("trimmed".into(), json!(false));
    obj.insert("spriteSourceSize".into(), frame);
    obj.insert("sourceSize".into(), json!({"w": r.w, "h": r.h}));
    obj
}

fn meta_value(sheet: &SheetConfig, name: &str) -> Value {
    json!({
        "image": format!("{}.png", name),
        "app": APP_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "scale": 1.0,
        "format": PIXEL_FORMAT,
        "size": {"w": sheet.width, "h": sheet.height},
    })
}

/// TexturePacker-style JSON array: `{ frames: [ { filename, frame, ... } ], meta }`.
pub fn to_json(sheet: &SheetConfig, name: &str, sprites: &[SpriteRecord]) -> Value {
    let frames: Vec<Value> = sprites
        .iter()
        .filter(|s| s.is_packed())
        .map(|s| {
            let mut obj = frame_value(sheet, s);
            obj.insert("filename".into(), json!(s.file_name()));
            Value::Object(obj)
        })
        .collect();
    json!({"frames": frames, "meta": meta_value(sheet, name)})
}

/// Unity variant: each frame is wrapped as `{ "<filename>": { frame, ... } }` and carries
/// no `filename` key of its own.
pub fn to_unity_json(sheet: &SheetConfig, name: &str, sprites: &[SpriteRecord]) -> Value {
    let frames: Vec<Value> = sprites
        .iter()
        .filter(|s| s.is_packed())
        .map(|s| {
            let mut wrapper = Map::new();
            wrapper.insert(s.file_name().to_string(), Value::Object(frame_value(sheet, s)));
            Value::Object(wrapper)
        })
        .collect();
    json!({"frames": frames, "meta": meta_value(sheet, name)})
}
