use image::RgbaImage;
use spritebunch_core::BuncherError;
use spritebunch_core::prelude::*;

fn one_sprite() -> Vec<SpriteRecord> {
    vec![SpriteRecord::new("a.png", RgbaImage::new(4, 4))]
}

#[test]
fn zero_sized_sheet_is_rejected() {
    let err = run_layout(&SheetConfig::new(0, 64), &mut one_sprite(), &LayoutOptions::default())
        .expect_err("zero width");
    assert!(matches!(
        err,
        BuncherError::InvalidDimensions {
            width: 0,
            height: 64
        }
    ));
}

#[test]
fn border_that_swallows_the_sheet_is_rejected() {
    let sheet = SheetConfig::new(20, 64).with_border(10);
    let err = run_layout(&sheet, &mut one_sprite(), &LayoutOptions::default())
        .expect_err("no interior");
    assert!(matches!(err, BuncherError::InvalidConfig(_)));
}

#[test]
fn non_positive_scale_is_rejected() {
    let sheet = SheetConfig::new(64, 64);
    for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        let opts = LayoutOptions::builder().scale(scale).build();
        let err = run_layout(&sheet, &mut one_sprite(), &opts).expect_err("bad scale");
        assert!(matches!(err, BuncherError::InvalidConfig(_)), "{scale}");
    }
}

#[test]
fn rejected_config_leaves_sprites_untouched() {
    let mut sprites = one_sprite();
    sprites[0].set_packed_rect(Rect::new(1, 1, 5, 5));
    let _ = run_layout(&SheetConfig::new(0, 0), &mut sprites, &LayoutOptions::default());
    assert_eq!(sprites[0].packed_rect(), Rect::new(1, 1, 5, 5));
}

#[test]
fn options_deserialize_with_defaults() {
    let opts: LayoutOptions = serde_json::from_str(r#"{"method":"rows","crop":true}"#).expect("json");
    assert_eq!(opts.method, PackMethod::Rows);
    assert!(opts.crop);
    assert_eq!(opts.heuristic, MaxRectsHeuristic::BestAreaFit);
    assert_eq!(opts.scale, 1.0);
    assert!(!opts.allow_rotation);
}

#[test]
fn method_and_heuristic_names_parse() {
    assert_eq!("shelf".parse::<PackMethod>(), Ok(PackMethod::Rows));
    assert_eq!("MaxRects".parse::<PackMethod>(), Ok(PackMethod::MaxRects));
    assert_eq!("cp".parse::<MaxRectsHeuristic>(), Ok(MaxRectsHeuristic::ContactPoint));
    assert!("guillotine".parse::<PackMethod>().is_err());
}

#[test]
fn sort_orders_break_ties_by_name() {
    let mut sprites = vec![
        SpriteRecord::new("c.png", RgbaImage::new(4, 4)),
        SpriteRecord::new("a.png", RgbaImage::new(2, 8)),
        SpriteRecord::new("b.png", RgbaImage::new(8, 8)),
        SpriteRecord::new("d.png", RgbaImage::new(8, 2)),
    ];
    let names = |v: &[SpriteRecord]| v.iter().map(|s| s.file_name().to_string()).collect::<Vec<_>>();

    sort_sprites(&mut sprites, SortOrder::AreaDesc);
    assert_eq!(names(&sprites), ["b.png", "a.png", "c.png", "d.png"]);
    sort_sprites(&mut sprites, SortOrder::WidthDesc);
    assert_eq!(names(&sprites), ["b.png", "d.png", "c.png", "a.png"]);
    sort_sprites(&mut sprites, SortOrder::HeightDesc);
    assert_eq!(names(&sprites), ["a.png", "b.png", "c.png", "d.png"]);
    sort_sprites(&mut sprites, SortOrder::NameAsc);
    assert_eq!(names(&sprites), ["a.png", "b.png", "c.png", "d.png"]);
}

#[test]
fn huge_padding_fails_the_sprite_instead_of_overflowing() {
    let sheet = SheetConfig::new(64, 64).with_padding(u32::MAX - 5);
    for method in [PackMethod::MaxRects, PackMethod::Rows] {
        let opts = LayoutOptions::builder().method(method).build();
        let mut sprites = one_sprite();
        let report = run_layout(&sheet, &mut sprites, &opts).expect("layout");
        assert_eq!(report.placed, 0, "{method:?}");
        assert_eq!(report.failed, 1, "{method:?}");
        assert!(!sprites[0].is_packed());
    }
}

#[test]
fn export_rect_saturates_with_huge_padding() {
    let sheet = SheetConfig::new(64, 64).with_padding(u32::MAX).with_border(2);
    let mut s = SpriteRecord::new("a.png", RgbaImage::new(4, 4));
    s.set_packed_rect(Rect::new(10, 10, 4, 4));
    assert_eq!(s.export_rect(&sheet), Rect::new(u32::MAX, u32::MAX, 0, 0));
}

#[test]
fn expand_that_cannot_fit_the_interior_is_rejected() {
    let sheet = SheetConfig::new(64, 64).with_border(2);
    let opts = LayoutOptions::builder().expand(30).build();
    let err = run_layout(&sheet, &mut one_sprite(), &opts).expect_err("expand too large");
    assert!(matches!(err, BuncherError::InvalidConfig(_)));

    let opts = LayoutOptions::builder().expand(u32::MAX / 2).build();
    let err = run_layout(&sheet, &mut one_sprite(), &opts).expect_err("expand too large");
    assert!(matches!(err, BuncherError::InvalidConfig(_)));

    let opts = LayoutOptions::builder().expand(29).build();
    assert!(run_layout(&sheet, &mut one_sprite(), &opts).is_ok());
}

#[test]
fn expand_refuses_sizes_that_overflow() {
    let img = RgbaImage::new(2, 2);
    assert!(spritebunch_core::preprocess::expand(&img, u32::MAX / 2).is_none());
    assert!(spritebunch_core::preprocess::expand(&img, u32::MAX).is_none());
    let grown = spritebunch_core::preprocess::expand(&img, 3).expect("small expand");
    assert_eq!(grown.dimensions(), (8, 8));
}
