use std::collections::BTreeMap;
use std::io::Cursor;

use super::*;
use crate::assets::source::MemorySource;
use crate::composition::format::FormatKey;
use crate::presets::table::PresetOverride;
use crate::render::surface::{DrawCommand, RecordingSurface};

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([9, 9, 9, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn record(pairs: &[(&str, &str)]) -> TraitRecord {
    TraitRecord::new(
        1,
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn compositor(src: Arc<MemorySource>) -> Compositor {
    Compositor::new(Arc::new(ImageCache::new(src)), CompositorSettings::default())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn cover_scale_uses_longest_side() {
    assert!(close(cover_scale(1080, 1080), 1080.0 / 2048.0));
    assert!(close(cover_scale(1080, 2340), 2340.0 / 2048.0));
    assert!(close(cover_scale(1600, 900), 1600.0 / 2048.0));
}

#[test]
fn character_transform_anchors_bottom_center() {
    let preset = ResolvedPreset {
        scale: 0.85,
        offset_x: 0.0,
        offset_y: 0.0,
    };
    let t = character_transform(1080, 1080, &preset);
    let bottom_center = t * kurbo::Point::new(1024.0, 2048.0);
    assert!(close(bottom_center.x, 540.0));
    assert!(close(bottom_center.y, 1080.0));

    let s = (1080.0 / 2048.0) * 0.85;
    let origin = t * kurbo::Point::new(0.0, 0.0);
    assert!(close(origin.x, 540.0 - 1024.0 * s));
    assert!(close(origin.y, 1080.0 - 2048.0 * s));
}

#[test]
fn offsets_shift_the_anchor() {
    let preset = ResolvedPreset {
        scale: 1.0,
        offset_x: 30.0,
        offset_y: -12.0,
    };
    let p = character_transform(1600, 900, &preset) * kurbo::Point::new(1024.0, 2048.0);
    assert!(close(p.x, 830.0));
    assert!(close(p.y, 888.0));
}

#[test]
fn zero_or_nan_scale_falls_back_to_one() {
    let unit = ResolvedPreset::default();
    for bad in [0.0, f64::NAN, f64::INFINITY] {
        let preset = ResolvedPreset { scale: bad, ..unit };
        assert_eq!(
            character_transform(1080, 1080, &preset),
            character_transform(1080, 1080, &unit)
        );
    }
}

#[test]
fn cover_rect_fills_and_centers() {
    let r = cover_rect(1080, 2340, 1000, 1000);
    assert!(close(r.height(), 2340.0));
    assert!(close(r.width(), 2340.0));
    assert!(close(r.x0, (1080.0 - 2340.0) / 2.0));
    assert!(close(r.y0, 0.0));

    let wide = cover_rect(1600, 900, 400, 100);
    assert!(close(wide.height(), 900.0));
    assert!(close(wide.width(), 3600.0));
}

#[test]
fn plan_orders_background_layers_and_overlay() {
    let c = compositor(Arc::new(MemorySource::new()));
    let rec = record(&[
        ("BACKGROUND", "Sky"),
        ("BODY", "Blue"),
        ("CLOTHING", "None"),
        ("HEADSTUFF", " Cap "),
        ("ONE OF ONE", "Crown"),
    ]);
    let scene = Scene {
        overlay: true,
        ..Scene::default()
    };
    let plan = c.plan(&scene, &rec, &ResolvedPreset::default(), 1080, 1080);
    let locations: Vec<&str> = plan.iter().map(|p| p.location.as_str()).collect();
    assert_eq!(
        locations,
        vec![
            "assets/layers/BACKGROUND/Sky.png",
            "assets/layers/BODY/Blue.png",
            "assets/layers/HEADSTUFF/Cap.png",
            "assets/layers/ONE OF ONE/Crown.png",
            "assets/layers/GMCUPS/Blue.png",
        ]
    );
    let Placement::Fixed { dest, .. } = plan[0].placement else {
        panic!("token background is a fixed square");
    };
    assert!(close(dest.width(), 1080.0));
}

#[test]
fn overlay_needs_a_body() {
    let c = compositor(Arc::new(MemorySource::new()));
    let scene = Scene {
        overlay: true,
        background: BackgroundMode::Disabled,
        ..Scene::default()
    };
    let plan = c.plan(
        &scene,
        &record(&[("BODY", "None"), ("MOUTHS", "Grin")]),
        &ResolvedPreset::default(),
        1080,
        1080,
    );
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].location, "assets/layers/MOUTHS/Grin.png");
}

#[test]
fn custom_background_defaults_to_format_default() {
    let c = compositor(Arc::new(MemorySource::new()));
    let scene = Scene {
        format: FormatKey::Raid,
        background: BackgroundMode::Custom,
        ..Scene::default()
    };
    let plan = c.plan(&scene, &record(&[]), &ResolvedPreset::default(), 1600, 900);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].location, "assets/costumbackgrounds/raid/raid1.png");
    assert_eq!(plan[0].placement, Placement::Cover);
}

#[tokio::test]
async fn render_fills_then_draws_and_skips_missing() {
    let src = Arc::new(MemorySource::new());
    src.insert("assets/layers/BODY/Blue.png", png(4, 4));
    let c = compositor(src);
    let mut surface = RecordingSurface::new(1080, 1080);
    let rec = record(&[("BODY", "Blue"), ("MOUTHS", "Lost")]);
    let scene = Scene {
        background: BackgroundMode::Disabled,
        ..Scene::default()
    };

    let report = c
        .render(&mut surface, &scene, &PresetTable::default(), &rec)
        .await
        .unwrap();

    assert_eq!(surface.commands[0], DrawCommand::Clear);
    assert_eq!(surface.commands[1], DrawCommand::Fill(Rgba8::base_fill()));
    assert_eq!(surface.drawn_locations(), vec!["assets/layers/BODY/Blue.png"]);
    assert_eq!(report.drawn, vec!["assets/layers/BODY/Blue.png".to_string()]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "assets/layers/MOUTHS/Lost.png");
    assert!(close(report.preset.scale, 0.85));
}

#[tokio::test]
async fn render_locks_scale_for_phone_custom_backgrounds() {
    let src = Arc::new(MemorySource::new());
    src.insert("assets/costumbackgrounds/phonesaver/phone2.png", png(10, 20));
    src.insert("assets/layers/BODY/Red.png", png(4, 4));
    let c = compositor(src);

    let mut table = PresetTable::default();
    table.custom_backgrounds.insert(
        "phonesaver/phone2.png".to_string(),
        PresetOverride::full(3.0, 0.0, 40.0),
    );
    let scene = Scene {
        format: FormatKey::PhoneSaver,
        background: BackgroundMode::Custom,
        custom_file: Some("phone2.png".to_string()),
        overlay: false,
    };
    let mut surface = RecordingSurface::new(1080, 2340);
    let report = c
        .render(&mut surface, &scene, &table, &record(&[("BODY", "Red")]))
        .await
        .unwrap();

    assert!(close(report.preset.scale, 0.5));
    assert!(close(report.preset.offset_y, 40.0));
    let DrawCommand::Image { dest, .. } = &surface.commands[2] else {
        panic!("background should be the first image");
    };
    assert!(close(dest.height(), 2340.0));
    assert!(close(dest.width(), 1170.0));
}

#[tokio::test]
async fn render_rejects_wrong_surface_size() {
    let c = compositor(Arc::new(MemorySource::new()));
    let mut surface = RecordingSurface::new(100, 100);
    let err = c
        .render(
            &mut surface,
            &Scene::default(),
            &PresetTable::default(),
            &record(&[]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RascalsError::Validation(_)));
    assert!(surface.commands.is_empty());
}
