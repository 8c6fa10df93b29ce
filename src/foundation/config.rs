use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::assets::source::{AssetSource, source_for_root};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{RascalsError, RascalsResult};
use crate::metadata::resolver::DEFAULT_METADATA_TEMPLATE;

/// Editor configuration: where assets live, how long to wait for them, and output naming.
///
/// Every field has a default, so a config file only needs the fields it changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Local directory or `http(s)` base URL all asset locations are relative to.
    pub asset_root: String,
    /// Metadata location template; `{id}` is replaced with the token id.
    pub metadata_template: String,
    /// Base of the trait layer folders (`<base>/BODY/<value>.png`, ...).
    pub layers_base: String,
    /// Base of the custom background catalogs (`<base>/<format>/<file>`).
    pub custom_backgrounds_base: String,
    pub presets_location: String,
    pub fetch_timeout_ms: u64,
    /// Prefix of exported file names.
    pub output_prefix: String,
    /// Page URL whose query carries the share state.
    pub share_base_url: String,
    pub base_fill: Rgba8,
    pub frame_interval_ms: u64,
    /// JSON file backing the persisted editor state.
    pub storage_path: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            asset_root: ".".to_string(),
            metadata_template: DEFAULT_METADATA_TEMPLATE.to_string(),
            layers_base: "assets/layers".to_string(),
            custom_backgrounds_base: "assets/costumbackgrounds".to_string(),
            presets_location: "scene-presets.json".to_string(),
            fetch_timeout_ms: 10_000,
            output_prefix: "rascal".to_string(),
            share_base_url: "http://localhost/editor/".to_string(),
            base_fill: Rgba8::base_fill(),
            frame_interval_ms: 16,
            storage_path: PathBuf::from("rascals-state.json"),
        }
    }
}

impl EditorConfig {
    /// Read a JSON config file; missing fields keep their defaults.
    pub fn from_path(path: &Path) -> RascalsResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> RascalsResult<Self> {
        let cfg: Self = serde_json::from_str(text).map_err(|e| RascalsError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> RascalsResult<()> {
        if self.fetch_timeout_ms == 0 {
            return Err(RascalsError::validation("fetch_timeout_ms must be > 0"));
        }
        if self.frame_interval_ms == 0 {
            return Err(RascalsError::validation("frame_interval_ms must be > 0"));
        }
        if !self.metadata_template.contains("{id}") {
            return Err(RascalsError::validation(
                "metadata_template must contain an {id} placeholder",
            ));
        }
        url::Url::parse(&self.share_base_url).map_err(|e| {
            RascalsError::validation(format!(
                "share_base_url '{}' is not a URL: {e}",
                self.share_base_url
            ))
        })?;
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Asset source for [`EditorConfig::asset_root`].
    pub fn asset_source(&self) -> Arc<dyn AssetSource> {
        source_for_root(&self.asset_root)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
