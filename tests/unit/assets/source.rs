use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "rascals_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn normalize_rel_path_rejects_escapes() {
    assert_eq!(normalize_rel_path("a/./b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(
        normalize_rel_path("assets/layers/ONE OF ONE/x.png").unwrap(),
        "assets/layers/ONE OF ONE/x.png"
    );
    assert!(normalize_rel_path("/etc/passwd").is_err());
    assert!(normalize_rel_path("a/../../b").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn source_for_root_picks_backend_by_scheme() {
    let http = format!("{:?}", source_for_root("https://cdn.example.com/rascals"));
    assert!(http.contains("HttpSource"));
    let fs = format!("{:?}", source_for_root("./site"));
    assert!(fs.contains("FsSource"));
}

#[test]
fn http_source_joins_under_base_directory() {
    let src = HttpSource::new(Url::parse("https://cdn.example.com/rascals").unwrap());
    assert_eq!(src.base().as_str(), "https://cdn.example.com/rascals/");
    let url = src.url_for("metadata/12.json").unwrap();
    assert_eq!(url.as_str(), "https://cdn.example.com/rascals/metadata/12.json");
    assert!(src.url_for("../secret").is_err());
}

#[tokio::test]
async fn fs_source_reads_and_reports_missing() {
    let dir = temp_dir("fs_source");
    std::fs::create_dir_all(dir.join("metadata")).unwrap();
    std::fs::write(dir.join("metadata/1.json"), b"{}").unwrap();

    let src = FsSource::new(&dir);
    assert_eq!(src.fetch("metadata/1.json").await.unwrap(), b"{}".to_vec());
    let err = src.fetch("metadata/2.json").await.unwrap_err();
    assert_eq!(
        err,
        AssetError::NotFound {
            location: "metadata/2.json".to_string()
        }
    );
    assert_eq!(err.location(), "metadata/2.json");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn memory_source_counts_fetches() {
    let src = MemorySource::new();
    src.insert("a.png", vec![1u8, 2, 3]);
    assert_eq!(src.fetch("a.png").await.unwrap(), vec![1, 2, 3]);
    assert!(src.fetch("b.png").await.is_err());
    assert_eq!(src.fetch_count("a.png"), 1);
    assert_eq!(src.fetch_count("b.png"), 1);
    assert_eq!(src.fetch_count("c.png"), 0);
}
