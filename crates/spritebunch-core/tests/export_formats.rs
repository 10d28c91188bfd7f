use image::{Rgba, RgbaImage};
use serde_json::Value;
use spritebunch_core::prelude::*;
use spritebunch_core::{BuncherError, to_json, to_unity_json};

fn sprite(name: &str, w: u32, h: u32) -> SpriteRecord {
    SpriteRecord::new(name, RgbaImage::from_pixel(w, h, Rgba([1, 2, 3, 255])))
}

/// Two placed sprites (one rotated) and one that did not fit, on a 128x64 sheet with
/// padding 2 and border 1.
fn fixture() -> (SheetConfig, Vec<SpriteRecord>) {
    let sheet = SheetConfig::new(128, 64).with_padding(2).with_border(1);
    let mut a = sprite("a.png", 10, 20);
    a.set_packed_rect(Rect::new(0, 0, 12, 22));
    let mut b = sprite("b.png", 30, 8);
    b.set_packed_rect(Rect::new(12, 0, 10, 32));
    b.set_rotated(true);
    let lost = sprite("lost.png", 500, 500);
    (sheet, vec![a, b, lost])
}

#[test]
fn generic_xml_lists_sheet_size_and_rotation() {
    let (sheet, sprites) = fixture();
    let xml = AtlasFormat::GenericXml
        .render(&sheet, "sheet", &sprites)
        .expect("render");
    let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- Exported from spritebunch -->
<TextureAtlas imagePath="sheet.png" width="128" height="64">
    <sprite n="a.png" x="3" y="3" w="10" h="20"/>
    <sprite n="b.png" x="15" y="3" w="8" h="30" r="y"/>
</TextureAtlas>
"#;
    assert_eq!(xml, expected);
}

#[test]
fn sparrow_has_no_rotation_attribute() {
    let (sheet, sprites) = fixture();
    let xml = AtlasFormat::Sparrow
        .render(&sheet, "sheet", &sprites)
        .expect("render");
    assert!(xml.contains(r#"<TextureAtlas imagePath="sheet.png">"#));
    assert!(xml.contains(r#"<SubTexture name="a.png" x="3" y="3" width="10" height="20"/>"#));
    assert!(xml.contains(r#"<SubTexture name="b.png" x="15" y="3" width="8" height="30"/>"#));
    assert!(!xml.contains("r=\"y\""));
    assert!(!xml.contains("lost.png"));
}

#[test]
fn xml_names_are_escaped() {
    let sheet = SheetConfig::new(32, 32);
    let mut s = sprite("a&b<\"c\">.png", 4, 4);
    s.set_packed_rect(Rect::new(0, 0, 4, 4));
    let xml = AtlasFormat::GenericXml
        .render(&sheet, "x", &[s])
        .expect("render");
    assert!(xml.contains(r#"n="a&amp;b&lt;&quot;c&quot;&gt;.png""#));
}

#[test]
fn plain_text_lines() {
    let (sheet, sprites) = fixture();
    let text = AtlasFormat::PlainText
        .render(&sheet, "sheet", &sprites)
        .expect("render");
    assert_eq!(
        text,
        "image=\"a.png\"\t x=3\t y=3\t width=10\t height=20\t rotated=0\n\
         image=\"b.png\"\t x=15\t y=3\t width=8\t height=30\t rotated=1\n"
    );
}

#[test]
fn gideros_lines() {
    let (sheet, sprites) = fixture();
    let text = AtlasFormat::Gideros
        .render(&sheet, "sheet", &sprites)
        .expect("render");
    assert_eq!(
        text,
        "a.png, 3, 3, 10, 20, 0, 0, 0, 0\nb.png, 15, 3, 8, 30, 0, 0, 0, 0\n"
    );
}

#[test]
fn libgdx_uses_base_names_and_never_rotates() {
    let (sheet, sprites) = fixture();
    let text = AtlasFormat::LibGdx
        .render(&sheet, "sheet", &sprites)
        .expect("render");
    let expected = "sheet.png
format: RGBA8888
filter: Linear,Linear
repeat: none
a
  rotate: false
  xy: 3, 3
  size: 10, 20
  orig: 10, 20
  offset: 0, 0
  index: -1
b
  rotate: false
  xy: 15, 3
  size: 8, 30
  orig: 8, 30
  offset: 0, 0
  index: -1
";
    assert_eq!(text, expected);
}

#[test]
fn cocos2d_plist_writes_inverted_rotation() {
    let (sheet, sprites) = fixture();
    let plist = AtlasFormat::Cocos2dPlist
        .render(&sheet, "sheet", &sprites)
        .expect("render");
    assert!(plist.contains("<key>a.png</key>"));
    assert!(plist.contains("<string>{{3,3},{10,20}}</string>"));
    assert!(plist.contains("<string>{{0,0},{10,20}}</string>"));
    assert!(plist.contains("<string>{10,20}</string>"));
    assert!(!plist.contains("<string>{{10,20}}</string>"));
    assert!(plist.contains("<string>{{15,3},{8,30}}</string>"));
    assert!(plist.contains("<string>sheet.png</string>"));
    assert!(!plist.contains("lost.png"));

    let lines: Vec<&str> = plist.lines().map(str::trim).collect();
    let rotated: Vec<&str> = lines
        .windows(2)
        .filter(|w| w[0] == "<key>rotated</key>")
        .map(|w| w[1])
        .collect();
    assert_eq!(rotated, vec!["<true/>", "<false/>"]);
}

#[test]
fn json_frames_carry_filename() {
    let (sheet, sprites) = fixture();
    let v = to_json(&sheet, "sheet", &sprites);
    let frames = v["frames"].as_array().expect("frames array");
    assert_eq!(frames.len(), 2);
    let a = &frames[0];
    assert_eq!(a["filename"], "a.png");
    assert_eq!(a["frame"]["x"], 3);
    assert_eq!(a["frame"]["y"], 3);
    assert_eq!(a["frame"]["w"], 10);
    assert_eq!(a["frame"]["h"], 20);
    assert_eq!(a["rotated"], false);
    assert_eq!(a["trimmed"], false);
    assert_eq!(a["spriteSourceSize"], a["frame"]);
    assert_eq!(a["sourceSize"]["w"], 10);
    assert_eq!(frames[1]["rotated"], true);

    let meta = &v["meta"];
    assert_eq!(meta["image"], "sheet.png");
    assert_eq!(meta["app"], "spritebunch");
    assert_eq!(meta["format"], "RGBA8888");
    assert_eq!(meta["size"]["w"], 128);
    assert_eq!(meta["size"]["h"], 64);
}

#[test]
fn unity_frames_are_keyed_by_filename() {
    let (sheet, sprites) = fixture();
    let v = to_unity_json(&sheet, "sheet", &sprites);
    let frames = v["frames"].as_array().expect("frames array");
    assert_eq!(frames.len(), 2);
    let wrapper = frames[0].as_object().expect("object");
    assert_eq!(wrapper.len(), 1);
    let inner = &wrapper["a.png"];
    assert!(inner.get("filename").is_none());
    assert_eq!(inner["frame"]["w"], 10);
    assert_eq!(frames[1]["b.png"]["rotated"], true);
}

#[test]
fn rendered_json_parses_back() {
    let (sheet, sprites) = fixture();
    for format in [AtlasFormat::Json, AtlasFormat::UnityJson] {
        let text = format.render(&sheet, "sheet", &sprites).expect("render");
        assert!(text.ends_with('\n'));
        let v: Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(v["meta"]["image"], "sheet.png");
    }
}

#[test]
fn exported_frames_match_the_layout() {
    let sheet = SheetConfig::new(128, 128).with_padding(3).with_border(4);
    let mut sprites: Vec<SpriteRecord> = (1..=12)
        .map(|i| sprite(&format!("s{i}.png"), 3 + i * 2, 20 - i))
        .collect();
    let opts = LayoutOptions::builder().allow_rotation(true).build();
    run_layout(&sheet, &mut sprites, &opts).expect("layout");

    let v = to_json(&sheet, "sheet", &sprites);
    let frames = v["frames"].as_array().expect("frames array");
    let placed: Vec<&SpriteRecord> = sprites.iter().filter(|s| s.is_packed()).collect();
    assert_eq!(frames.len(), placed.len());
    for (frame, s) in frames.iter().zip(placed) {
        let r = s.packed_rect();
        assert_eq!(frame["filename"], s.file_name());
        assert_eq!(frame["frame"]["x"], r.x + 4 + 3);
        assert_eq!(frame["frame"]["y"], r.y + 4 + 3);
        assert_eq!(frame["frame"]["w"], r.w - 3);
        assert_eq!(frame["frame"]["h"], r.h - 3);
        assert_eq!(frame["rotated"], s.is_rotated());
    }
}

#[test]
fn format_ids_round_trip() {
    for format in AtlasFormat::ALL {
        assert_eq!(format.id().parse::<AtlasFormat>().expect("parse"), format);
    }
    assert!(matches!(
        "bmfont".parse::<AtlasFormat>(),
        Err(BuncherError::UnknownFormat(_))
    ));
}

#[test]
fn export_atlas_writes_and_truncates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (sheet, mut sprites) = fixture();

    let path = export_atlas(AtlasFormat::Json, &sheet, dir.path(), "sheet", &sprites)
        .expect("export");
    assert_eq!(path, dir.path().join("sheet.json"));
    let first = std::fs::read_to_string(&path).expect("read");
    assert_eq!(
        first,
        AtlasFormat::Json.render(&sheet, "sheet", &sprites).expect("render")
    );

    sprites.truncate(1);
    export_atlas(AtlasFormat::Json, &sheet, dir.path(), "sheet", &sprites).expect("export");
    let second = std::fs::read_to_string(&path).expect("read");
    assert!(second.len() < first.len());
    assert!(!second.contains("b.png"));
}

#[test]
fn export_atlas_uses_format_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (sheet, sprites) = fixture();
    for format in AtlasFormat::ALL {
        let path = export_atlas(format, &sheet, dir.path(), "atlas", &sprites).expect("export");
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert_eq!(name, format!("atlas{}", format.extension()));
        assert!(path.exists());
    }
}

#[test]
fn export_into_missing_directory_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("does").join("not").join("exist");
    let (sheet, sprites) = fixture();
    let err = export_atlas(AtlasFormat::GenericXml, &sheet, &missing, "sheet", &sprites)
        .expect_err("must fail");
    assert!(matches!(err, BuncherError::Io(_)));
}

#[test]
fn settings_indices_cover_every_format() {
    for format in AtlasFormat::ALL {
        assert_eq!(AtlasFormat::from_settings_index(format.settings_index()), Some(format));
    }
    assert_eq!(AtlasFormat::from_settings_index(4), Some(AtlasFormat::Json));
    assert_eq!(AtlasFormat::from_settings_index(7), Some(AtlasFormat::Cocos2dPlist));
    assert_eq!(AtlasFormat::from_settings_index(8), None);
}

#[test]
fn open_reports_missing_and_undecodable_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = SpriteRecord::open(dir.path().join("nope.png"), "nope.png").expect_err("missing");
    assert!(matches!(missing, BuncherError::Io(_)));

    let junk = dir.path().join("junk.png");
    std::fs::write(&junk, b"not an image").expect("write");
    let bad = SpriteRecord::open(&junk, "junk.png").expect_err("undecodable");
    assert!(matches!(bad, BuncherError::Image(_)));

    let good = dir.path().join("ok.png");
    RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]))
        .save(&good)
        .expect("save");
    let s = SpriteRecord::open(&good, "ok.png").expect("open");
    assert_eq!(s.file_name(), "ok.png");
    assert_eq!(s.original().dimensions(), (3, 2));
}
