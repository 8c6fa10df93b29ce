use super::*;
use crate::assets::source::MemorySource;

#[test]
fn strips_line_and_block_comments() {
    let src = r#"{
  // hand edited
  "a": 1, /* inline */ "b": 2
  /* multi
     line */
}"#;
    let v: serde_json::Value = serde_json::from_str(&strip_json_comments(src)).unwrap();
    assert_eq!(v["a"], 1);
    assert_eq!(v["b"], 2);
}

#[test]
fn keeps_comment_markers_inside_strings() {
    let src = r#"{"url": "https://x.test/a//b", "glob": "/* not a comment */", "q": "say \"//\""}"#;
    let stripped = strip_json_comments(src);
    assert_eq!(stripped, src);
}

#[test]
fn preserves_line_count() {
    let src = "{\n/* a\nb */\n\"k\": 1 // c\n}";
    assert_eq!(strip_json_comments(src).lines().count(), src.lines().count());
}

#[tokio::test]
async fn load_json_reports_parse_errors() {
    let src = MemorySource::new();
    src.insert("bad.json", b"{ nope".to_vec());
    let err = load_json(&src, "bad.json", Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, JsonLoadError::Parse { .. }));
}

#[tokio::test]
async fn load_json_passes_fetch_errors_through() {
    let src = MemorySource::new();
    let err = load_json(&src, "missing.json", Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JsonLoadError::Fetch(AssetError::NotFound { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn load_json_times_out() {
    let src = MemorySource::with_latency(Duration::from_secs(30));
    src.insert("slow.json", b"{}".to_vec());
    let err = load_json(&src, "slow.json", Duration::from_secs(10))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        JsonLoadError::Timeout {
            location: "slow.json".to_string(),
            after_ms: 10_000
        }
    );
}
