use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::assets::decode::{PreparedImage, decode_image};
use crate::assets::source::{AssetError, AssetSource};

/// Outcome of one image load, shared by every consumer of the same location.
pub type ImageLoad = Result<Arc<PreparedImage>, AssetError>;

/// Pending or finished image load. Cloning is cheap; all clones resolve to the same result.
pub type ImageHandle = Shared<BoxFuture<'static, ImageLoad>>;

/// Location-keyed image cache.
///
/// The first request for a location starts the fetch and decode; later requests (concurrent or
/// not) attach to the same handle, so each location is fetched at most once per cache. Failed
/// loads stay cached as failures.
pub struct ImageCache {
    source: Arc<dyn AssetSource>,
    entries: Mutex<HashMap<String, ImageHandle>>,
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("source", &self.source)
            .field("entries", &self.len())
            .finish()
    }
}

impl ImageCache {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Shared handle for `location`, starting the load if nobody asked for it yet.
    pub fn handle(&self, location: &str) -> ImageHandle {
        if location.trim().is_empty() {
            let err = AssetError::InvalidLocation {
                location: location.to_string(),
                reason: "empty image location".to_string(),
            };
            return futures::future::ready(Err(err)).boxed().shared();
        }

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = entries.get(location) {
            return existing.clone();
        }

        let fetch = self.source.fetch(location);
        let owned = location.to_string();
        let handle = async move {
            let bytes = fetch.await?;
            decode_image(&bytes, &owned).map(Arc::new)
        }
        .boxed()
        .shared();
        entries.insert(location.to_string(), handle.clone());
        tracing::debug!(%location, "image load started");
        handle
    }

    /// Load (or join the load of) `location`.
    pub async fn load(&self, location: &str) -> ImageLoad {
        self.handle(location).await
    }

    /// Finished result for `location` without waiting, if the load has completed.
    pub fn peek(&self, location: &str) -> Option<ImageLoad> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(location)
            .and_then(|h| h.peek().cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
