use crate::config::SheetConfig;
use crate::export::APP_NAME;
use crate::sprite::SpriteRecord;
use std::fmt::Write;

pub(crate) fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

struct XmlTags {
    sprite: &'static str,
    name: &'static str,
    width: &'static str,
    height: &'static str,
    starling: bool,
}

const GENERIC: XmlTags = XmlTags {
    sprite: "sprite",
    name: "n",
    width: "w",
    height: "h",
    starling: false,
};

const STARLING: XmlTags = XmlTags {
    sprite: "SubTexture",
    name: "name",
    width: "width",
    height: "height",
    starling: true,
};

/// Generic `<TextureAtlas>` XML with sheet size and an `r="y"` marker on rotated sprites.
pub fn to_generic_xml(sheet: &SheetConfig, name: &str, sprites: &[SpriteRecord]) -> String {
    texture_atlas(sheet, name, sprites, &GENERIC)
}

/// Sparrow / Starling `<SubTexture>` XML. The format has no rotation attribute and no
/// sheet size.
pub fn to_sparrow_xml(sheet: &SheetConfig, name: &str, sprites: &[SpriteRecord]) -> String {
    texture_atlas(sheet, name, sprites, &STARLING)
}

fn texture_atlas(sheet: &SheetConfig, name: &str, sprites: &[SpriteRecord], tags: &XmlTags) -> String {
    let mut s = String::new();
    s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(s, "<!-- Exported from {} -->", APP_NAME);
    let _ = write!(s, "<TextureAtlas imagePath=\"{}.png\"", xml_escape(name));
    if !tags.starling {
        let _ = write!(s, " width=\"{}\" height=\"{}\"", sheet.width, sheet.height);
    }
    s.push_str(">\n");
    for sprite in sprites.iter().filter(|s| s.is_packed()) {
        let r = sprite.export_rect(sheet);
        let _ = write!(
            s,
            "    <{} {}=\"{}\" x=\"{}\" y=\"{}\" {}=\"{}\" {}=\"{}\"",
            tags.sprite,
            tags.name,
            xml_escape(sprite.file_name()),
            r.x,
            r.y,
            tags.width,
            r.w,
            tags.height,
            r.h
        );
        if !tags.starling && sprite.is_rotated() {
            s.push_str(" r=\"y\"");
        }
        s.push_str("/>\n");
    }
    s.push_str("</TextureAtlas>\n");
    s
}
