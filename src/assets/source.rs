use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use url::Url;

/// Failure to fetch or decode one asset. Cloneable so shared loads can hand it to every waiter.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum AssetError {
    #[error("asset location '{location}' is invalid: {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("asset '{location}' not found")]
    NotFound { location: String },

    #[error("asset '{location}' returned HTTP {status}")]
    Status { location: String, status: u16 },

    #[error("failed to read asset '{location}': {message}")]
    Io { location: String, message: String },

    #[error("failed to decode asset '{location}': {message}")]
    Decode { location: String, message: String },
}

impl AssetError {
    /// The location the failing request was made for.
    pub fn location(&self) -> &str {
        match self {
            AssetError::InvalidLocation { location, .. }
            | AssetError::NotFound { location }
            | AssetError::Status { location, .. }
            | AssetError::Io { location, .. }
            | AssetError::Decode { location, .. } => location,
        }
    }
}

/// Async byte source that resolves relative locations against a fixed root.
///
/// Returned futures are `'static` so they can be shared between concurrent consumers.
pub trait AssetSource: Send + Sync + fmt::Debug {
    /// Fetch the raw bytes stored at `location`.
    fn fetch(&self, location: &str) -> BoxFuture<'static, Result<Vec<u8>, AssetError>>;
}

/// Normalize a relative asset location: `/` separators, no `.` segments, no `..`, not absolute.
pub fn normalize_rel_path(location: &str) -> Result<String, AssetError> {
    let invalid = |reason: &str| AssetError::InvalidLocation {
        location: location.to_string(),
        reason: reason.to_string(),
    };

    let s = location.replace('\\', "/");
    if s.starts_with('/') {
        return Err(invalid("asset paths must be relative"));
    }
    if s.trim().is_empty() {
        return Err(invalid("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(invalid("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(invalid("asset path must contain a file name"));
    }
    Ok(out.join("/"))
}

/// Reads assets from a local directory tree.
#[derive(Clone, Debug)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsSource {
    fn fetch(&self, location: &str) -> BoxFuture<'static, Result<Vec<u8>, AssetError>> {
        let location = location.to_string();
        let norm = normalize_rel_path(&location);
        let root = self.root.clone();
        async move {
            let path = root.join(Path::new(&norm?));
            tokio::fs::read(&path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AssetError::NotFound { location }
                } else {
                    AssetError::Io {
                        location,
                        message: format!("{}: {e}", path.display()),
                    }
                }
            })
        }
        .boxed()
    }
}

/// Fetches assets over HTTP(S) relative to a base URL.
#[derive(Clone, Debug)]
pub struct HttpSource {
    base: Url,
    client: reqwest::Client,
}

impl HttpSource {
    /// `base` is treated as a directory: a missing trailing `/` is added.
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            base,
            client: reqwest::Client::new(),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, location: &str) -> Result<Url, AssetError> {
        let norm = normalize_rel_path(location)?;
        self.base
            .join(&norm)
            .map_err(|e| AssetError::InvalidLocation {
                location: location.to_string(),
                reason: e.to_string(),
            })
    }
}

impl AssetSource for HttpSource {
    fn fetch(&self, location: &str) -> BoxFuture<'static, Result<Vec<u8>, AssetError>> {
        let location = location.to_string();
        let url = self.url_for(&location);
        let client = self.client.clone();
        async move {
            let url = url?;
            let io = |e: reqwest::Error, location: &str| AssetError::Io {
                location: location.to_string(),
                message: e.to_string(),
            };
            let resp = client
                .get(url)
                .header(reqwest::header::CACHE_CONTROL, "no-store")
                .send()
                .await
                .map_err(|e| io(e, &location))?;
            let status = resp.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(AssetError::NotFound { location });
            }
            if !status.is_success() {
                return Err(AssetError::Status {
                    location,
                    status: status.as_u16(),
                });
            }
            let bytes = resp.bytes().await.map_err(|e| io(e, &location))?;
            Ok(bytes.to_vec())
        }
        .boxed()
    }
}

/// Pick a source for `root`: `http://` and `https://` roots go over the network, anything else
/// is a local directory.
pub fn source_for_root(root: &str) -> Arc<dyn AssetSource> {
    match Url::parse(root) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            let src = HttpSource::new(url);
            tracing::debug!(base = %src.base(), "assets served over http");
            Arc::new(src)
        }
        _ => {
            let src = FsSource::new(root);
            tracing::debug!(root = %src.root().display(), "assets served from disk");
            Arc::new(src)
        }
    }
}

/// In-memory source, used for bundled assets and tests. Optionally delays every fetch.
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    fetches: Mutex<HashMap<String, usize>>,
    latency: Option<Duration>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch sleeps for `latency` before answering.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn insert(&self, location: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(location.into(), bytes.into());
    }

    /// How many fetches were issued for `location` so far.
    pub fn fetch_count(&self, location: &str) -> usize {
        self.fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(location)
            .copied()
            .unwrap_or(0)
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, location: &str) -> BoxFuture<'static, Result<Vec<u8>, AssetError>> {
        *self
            .fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(location.to_string())
            .or_default() += 1;
        let found = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(location)
            .cloned();
        let location = location.to_string();
        let latency = self.latency;
        async move {
            if let Some(d) = latency {
                tokio::time::sleep(d).await;
            }
            found.ok_or(AssetError::NotFound { location })
        }
        .boxed()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
