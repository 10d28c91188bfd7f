use crate::config::SheetConfig;
use crate::export_xml::xml_escape;
use crate::sprite::SpriteRecord;
use std::fmt::Write;

const TAB: &str = "    ";

/// Cocos2d-style Apple plist (XML) with a `frames` dict keyed by file name and a
/// `metadata` dict naming the sheet texture.
///
/// The `rotated` value is written inverted relative to the sprite's rotation flag
/// (`<true/>` for unrotated sprites). Existing consumers of this exporter's output
/// depend on that polarity, so it is kept as is.
///
/// `sourceSize` is written as a size string `{w,h}`. Older output of this format
/// wrapped it in a second pair of braces (`{{w,h}}`), which Cocos2d parses as a
/// malformed size; that form is not reproduced.
pub fn to_cocos2d_plist(sheet: &SheetConfig, name: &str, sprites: &[SpriteRecord]) -> String {
    let tab2 = TAB.repeat(2);
    let tab3 = TAB.repeat(3);
    let tab4 = TAB.repeat(4);
    let mut s = String::new();
    s.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple Computer//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
"#);
    let _ = writeln!(s, "{TAB}<dict>");
    let _ = writeln!(s, "{tab2}<key>frames</key>");
    let _ = writeln!(s, "{tab2}<dict>");
    for sprite in sprites.iter().filter(|s| s.is_packed()) {
        let r = sprite.export_rect(sheet);
        let pos = format!("{{{},{}}}", r.x, r.y);
        let size = format!("{{{},{}}}", r.w, r.h);
        let _ = writeln!(s, "{tab3}<key>{}</key>", xml_escape(sprite.file_name()));
        let _ = writeln!(s, "{tab4}<dict>");
        let _ = writeln!(s, "{tab4}<key>frame</key>");
        let _ = writeln!(s, "{tab4}<string>{{{},{}}}</string>", pos, size);
        let _ = writeln!(s, "{tab4}<key>offset</key>");
        let _ = writeln!(s, "{tab4}<string>{{0,0}}</string>");
        let _ = writeln!(s, "{tab4}<key>rotated</key>");
        let inverted = if sprite.is_rotated() { "<false/>" } else { "<true/>" };
        let _ = writeln!(s, "{tab4}{}", inverted);
        let _ = writeln!(s, "{tab4}<key>sourceColorRect</key>");
        let _ = writeln!(s, "{tab4}<string>{{{{0,0}},{}}}</string>", size);
        let _ = writeln!(s, "{tab4}<key>sourceSize</key>");
        let _ = writeln!(s, "{tab4}<string>{}</string>", size);
        let _ = writeln!(s, "{tab3}</dict>");
    }
    let _ = writeln!(s, "{tab2}</dict>");
    let _ = writeln!(s, "{tab2}<key>metadata</key>");
    let _ = writeln!(s, "{tab2}<dict>");
    let _ = writeln!(s, "{tab3}<key>textureFileName</key>");
    let _ = writeln!(s, "{tab3}<string>{}.png</string>", xml_escape(name));
    let _ = writeln!(s, "{tab2}</dict>");
    let _ = writeln!(s, "{TAB}</dict>");
    s.push_str("</plist>\n");
    s
}
