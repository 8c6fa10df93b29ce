use std::io::Cursor;
use std::time::Duration;

use super::*;
use crate::assets::source::MemorySource;
use crate::session::persist::{MemoryStore, STATE_KEY};

fn png(px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn source() -> Arc<MemorySource> {
    let src = Arc::new(MemorySource::new());
    src.insert(
        "metadata/1.json",
        r#"{"attributes": [
            {"trait_type": "BACKGROUND", "value": "Sky"},
            {"trait_type": "BODY", "value": "Blue"},
            {"trait_type": "MOUTHS", "value": "None"}
        ]}"#,
    );
    src.insert("metadata/2.json", r#"{"BODY": "Red", "HEADSTUFF": "Cap"}"#);
    src.insert("assets/layers/BACKGROUND/Sky.png", png([0, 0, 255, 255]));
    src.insert("assets/layers/BODY/Blue.png", png([0, 128, 255, 255]));
    src.insert("assets/layers/BODY/Red.png", png([255, 0, 0, 255]));
    src.insert("assets/layers/HEADSTUFF/Cap.png", png([9, 9, 9, 255]));
    src
}

async fn open(src: Arc<MemorySource>, store: Arc<MemoryStore>) -> Editor {
    Editor::open(EditorConfig::default(), src, store, None)
        .await
        .unwrap()
}

#[tokio::test]
async fn first_frame_renders_the_persisted_token() {
    let mut ed = open(source(), Arc::new(MemoryStore::new())).await;
    assert!(ed.scheduler().is_pending());

    let FrameOutcome::Rendered(report) = ed.on_frame().await.unwrap() else {
        panic!("expected a render");
    };
    assert_eq!(
        report.drawn,
        vec![
            "assets/layers/BACKGROUND/Sky.png".to_string(),
            "assets/layers/BODY/Blue.png".to_string(),
        ]
    );
    assert_eq!(ed.status(), &Status::Ready { token: 1, skipped: 0 });
    assert_eq!(ed.status().to_string(), "Built #1 · ready");
    assert_eq!(ed.history().len(), 1);
    assert!(ed.last_png().is_some());
    assert_eq!(ed.on_frame().await.unwrap(), FrameOutcome::Idle);
}

#[tokio::test]
async fn bursts_of_actions_render_once() {
    let mut ed = open(source(), Arc::new(MemoryStore::new())).await;
    ed.on_frame().await.unwrap();

    ed.set_overlay(true);
    ed.set_background_mode(BackgroundMode::Disabled);
    ed.select_format(FormatKey::Raid);
    assert!(matches!(ed.on_frame().await.unwrap(), FrameOutcome::Rendered(_)));
    assert_eq!(ed.on_frame().await.unwrap(), FrameOutcome::Idle);
    assert_eq!(ed.history().len(), 2);
}

#[tokio::test]
async fn actions_persist_and_refresh_the_share_link() {
    let store = Arc::new(MemoryStore::new());
    let mut ed = open(source(), store.clone()).await;
    ed.set_token(2);
    ed.select_format(FormatKey::PhoneSaver);

    let saved = store.read(STATE_KEY).unwrap();
    assert!(saved.contains(r#""format":"phonesaver""#));
    assert!(saved.contains(r#""tokens":[2]"#));
    assert_eq!(
        ed.share_url().query(),
        Some("fmt=phonesaver&t=2&uc=0&cb=phone1.png&nb=0&gmc=0")
    );
}

#[tokio::test]
async fn selecting_the_active_format_schedules_nothing() {
    let mut ed = open(source(), Arc::new(MemoryStore::new())).await;
    ed.on_frame().await.unwrap();
    assert!(!ed.select_format(FormatKey::Square));
    assert!(!ed.scheduler().is_pending());
}

#[tokio::test]
async fn metadata_is_fetched_only_when_the_token_changes() {
    let src = source();
    let mut ed = open(src.clone(), Arc::new(MemoryStore::new())).await;
    ed.on_frame().await.unwrap();
    ed.set_overlay(true);
    ed.on_frame().await.unwrap();
    assert_eq!(src.fetch_count("metadata/1.json"), 1);

    ed.step_token(1);
    ed.on_frame().await.unwrap();
    assert_eq!(src.fetch_count("metadata/2.json"), 1);
    assert_eq!(ed.state().token, 2);
}

#[tokio::test]
async fn missing_metadata_sets_missing_status_and_skips_composite() {
    let mut ed = open(source(), Arc::new(MemoryStore::new())).await;
    ed.set_token(77);
    let outcome = ed.on_frame().await.unwrap();
    assert!(matches!(
        outcome,
        FrameOutcome::Missing(MetadataFetchError::Unavailable { id: 77, .. })
    ));
    assert!(matches!(ed.status(), Status::Missing { token: 77, .. }));
    assert!(ed.history().is_empty());
    assert!(ed.last_png().is_none());
}

#[tokio::test(start_paused = true)]
async fn slow_metadata_times_out_as_missing() {
    let src = Arc::new(MemorySource::with_latency(Duration::from_secs(30)));
    src.insert("metadata/1.json", "{}");
    let config = EditorConfig {
        fetch_timeout_ms: 200,
        ..EditorConfig::default()
    };
    let mut ed = Editor::open(config, src, Arc::new(MemoryStore::new()), None)
        .await
        .unwrap();
    let outcome = ed.on_frame().await.unwrap();
    assert_eq!(
        outcome,
        FrameOutcome::Missing(MetadataFetchError::Timeout {
            id: 1,
            after_ms: 200
        })
    );
}

#[tokio::test]
async fn restore_history_brings_back_format_and_token() {
    let mut ed = open(source(), Arc::new(MemoryStore::new())).await;
    ed.on_frame().await.unwrap();
    ed.set_token(2);
    ed.select_format(FormatKey::Raid);
    ed.step_background(2);
    ed.on_frame().await.unwrap();
    assert_eq!(ed.history().get(0).unwrap().label(), "Raid · #2");

    ed.restore_history(1).unwrap();
    assert_eq!(ed.state().format, FormatKey::Square);
    assert_eq!(ed.state().token, 1);
    assert_eq!(ed.state().background, BackgroundMode::FromToken);
    assert!(ed.scheduler().is_pending());
    assert!(ed.restore_history(9).is_err());
}

#[tokio::test]
async fn restore_brings_back_the_default_custom_background() {
    let mut ed = open(source(), Arc::new(MemoryStore::new())).await;
    ed.select_format(FormatKey::PhoneSaver);
    ed.set_background_mode(BackgroundMode::Custom);
    ed.on_frame().await.unwrap();
    assert_eq!(
        ed.history().get(0).unwrap().custom_file.as_deref(),
        Some("phone1.png")
    );

    ed.select_custom_background("phone2.png").unwrap();
    ed.on_frame().await.unwrap();
    assert_eq!(ed.state().custom_for(FormatKey::PhoneSaver), "phone2.png");

    ed.restore_history(1).unwrap();
    assert_eq!(ed.state().background, BackgroundMode::Custom);
    assert_eq!(ed.state().custom_for(FormatKey::PhoneSaver), "phone1.png");
}

#[tokio::test]
async fn traits_listing_marks_empty_layers() {
    let mut ed = open(source(), Arc::new(MemoryStore::new())).await;
    ed.set_overlay(true);
    ed.on_frame().await.unwrap();
    let rows = ed.traits_listing();
    assert_eq!(rows[0], ("BODY".to_string(), "Blue".to_string()));
    assert!(rows.contains(&("MOUTHS".to_string(), MISSING_TRAIT.to_string())));
    assert_eq!(
        rows.last().unwrap(),
        &("GMCUPS".to_string(), "Blue".to_string())
    );
    assert_eq!(rows.len(), 7);
}

#[tokio::test]
async fn output_meta_and_export_name_follow_state() {
    let mut ed = open(source(), Arc::new(MemoryStore::new())).await;
    ed.set_token(42);
    ed.select_format(FormatKey::PhoneSaver);
    ed.step_background(1);
    assert_eq!(
        ed.output_meta(),
        OutputMeta {
            name: "Phone Saver #42".to_string(),
            size: "1080 × 2340".to_string(),
            background: "Custom BG: phone2.png".to_string(),
        }
    );
    assert_eq!(ed.export_filename(), "rascal_0042_phonesaver.png");
    assert!(ed.export(Path::new("/tmp")).is_err());
}

#[tokio::test]
async fn unknown_custom_background_is_rejected() {
    let mut ed = open(source(), Arc::new(MemoryStore::new())).await;
    assert!(ed.select_custom_background("raid1.png").is_err());
    assert!(ed.select_custom_background("square2.png").unwrap());
    assert_eq!(ed.state().background, BackgroundMode::FromToken);
}

#[test]
fn status_lines_read_like_the_status_bar() {
    assert_eq!(Status::Loading { token: 3 }.to_string(), "Loading metadata…");
    assert_eq!(
        Status::Ready {
            token: 3,
            skipped: 2
        }
        .to_string(),
        "Built #3 · ready (2 layers missing)"
    );
    assert_eq!(
        Status::Failed {
            reason: "boom".into()
        }
        .to_string(),
        "Failed · boom"
    );
}
