use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::assets::json::load_json;
use crate::assets::source::AssetSource;

/// Partial placement adjustment; unset fields leave earlier values untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresetOverride {
    #[serde(
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub scale: Option<f64>,
    #[serde(
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub offset_x: Option<f64>,
    #[serde(
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub offset_y: Option<f64>,
}

impl PresetOverride {
    /// Override with every field set.
    pub const fn full(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale: Some(scale),
            offset_x: Some(offset_x),
            offset_y: Some(offset_y),
        }
    }

    /// Copy of `self` with `scale` dropped.
    pub fn without_scale(self) -> Self {
        Self {
            scale: None,
            ..self
        }
    }

    /// Overlay `later` on top of `self`: fields set in `later` win.
    pub fn then(self, later: &PresetOverride) -> Self {
        Self {
            scale: later.scale.or(self.scale),
            offset_x: later.offset_x.or(self.offset_x),
            offset_y: later.offset_y.or(self.offset_y),
        }
    }
}

/// Accepts numbers, numeric strings and null; anything else counts as unset.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite()))
}

/// Fully defined placement transform.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPreset {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ResolvedPreset {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// Merge overrides left to right on top of `{scale: 1, offsetX: 0, offsetY: 0}`.
pub fn merge<'a>(layers: impl IntoIterator<Item = &'a PresetOverride>) -> ResolvedPreset {
    let merged = layers
        .into_iter()
        .fold(PresetOverride::default(), |acc, o| acc.then(o));
    let root = ResolvedPreset::default();
    ResolvedPreset {
        scale: merged.scale.unwrap_or(root.scale),
        offset_x: merged.offset_x.unwrap_or(root.offset_x),
        offset_y: merged.offset_y.unwrap_or(root.offset_y),
    }
}

/// Loaded override tree (`scene-presets.json`).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresetTable {
    pub defaults: PresetOverride,
    /// Keyed by format key.
    pub format_defaults: BTreeMap<String, PresetOverride>,
    /// Keyed by `BODY` trait value.
    pub body_overrides: BTreeMap<String, PresetOverride>,
    /// Keyed by `"<format>/<BODY value>"`.
    pub body_overrides_by_format: BTreeMap<String, PresetOverride>,
    /// Keyed by format key; applies to any custom background.
    pub custom_format_defaults: BTreeMap<String, PresetOverride>,
    /// Keyed by `"<format>/<file>"` or `"<format>/*"`.
    pub custom_backgrounds: BTreeMap<String, PresetOverride>,
}

impl PresetTable {
    /// Parse a table from JSON text (comments are not accepted here).
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Load the table from `location`, falling back to an empty table on any failure.
    ///
    /// An empty table resolves every format to its built-in baseline.
    #[tracing::instrument(skip(source))]
    pub async fn load_or_default(
        source: &dyn AssetSource,
        location: &str,
        timeout: Duration,
    ) -> Self {
        let value = match load_json(source, location, timeout).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(%location, error = %e, "preset table failed to load; using baselines");
                return Self::default();
            }
        };
        match serde_json::from_value::<PresetTable>(value) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(%location, error = %e, "preset table has unexpected shape; using baselines");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presets/table.rs"]
mod tests;
