use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::assets::json::{JsonLoadError, load_json};
use crate::assets::source::{AssetError, AssetSource};

/// Default metadata location template; `{id}` is replaced with the token id.
pub const DEFAULT_METADATA_TEMPLATE: &str = "metadata/{id}.json";

/// Default time budget for one metadata request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait values of one token, keyed by layer name (`BODY`, `CLOTHING`, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraitRecord {
    pub id: u32,
    pub values: BTreeMap<String, String>,
}

impl TraitRecord {
    pub fn new(id: u32, values: BTreeMap<String, String>) -> Self {
        Self { id, values }
    }

    /// Trait value for `layer`, if the record carries one.
    pub fn get(&self, layer: &str) -> Option<&str> {
        self.values.get(layer).map(String::as_str)
    }
}

/// Why a token's metadata could not be resolved.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum MetadataFetchError {
    #[error("metadata for token #{id} is unavailable: {source}")]
    Unavailable { id: u32, source: AssetError },

    #[error("metadata for token #{id} returned HTTP {status}")]
    Status { id: u32, status: u16 },

    #[error("metadata for token #{id} is malformed: {message}")]
    Parse { id: u32, message: String },

    #[error("metadata for token #{id} timed out after {after_ms} ms")]
    Timeout { id: u32, after_ms: u64 },
}

impl MetadataFetchError {
    pub fn id(&self) -> u32 {
        match self {
            MetadataFetchError::Unavailable { id, .. }
            | MetadataFetchError::Status { id, .. }
            | MetadataFetchError::Parse { id, .. }
            | MetadataFetchError::Timeout { id, .. } => *id,
        }
    }

    fn from_load(id: u32, err: JsonLoadError) -> Self {
        match err {
            JsonLoadError::Fetch(AssetError::Status { status, .. }) => Self::Status { id, status },
            JsonLoadError::Fetch(source) => Self::Unavailable { id, source },
            JsonLoadError::Timeout { after_ms, .. } => Self::Timeout { id, after_ms },
            JsonLoadError::Parse { message, .. } => Self::Parse { id, message },
        }
    }
}

/// Build a [`TraitRecord`] from a parsed metadata document.
///
/// An `attributes: [{trait_type, value}]` array takes precedence; otherwise the top-level
/// object is read as a flat layer → value map. Scalars are stringified; nulls, arrays and
/// objects are ignored.
pub fn record_from_json(id: u32, json: &Value) -> Result<TraitRecord, MetadataFetchError> {
    let Some(obj) = json.as_object() else {
        return Err(MetadataFetchError::Parse {
            id,
            message: "expected a JSON object".to_string(),
        });
    };

    let mut values = BTreeMap::new();
    if let Some(attrs) = obj.get("attributes").and_then(Value::as_array) {
        for attr in attrs {
            let Some(layer) = attr.get("trait_type").and_then(Value::as_str) else {
                continue;
            };
            if let Some(v) = attr.get("value").and_then(scalar_to_string) {
                values.insert(layer.to_string(), v);
            }
        }
    } else {
        for (layer, v) in obj {
            if let Some(v) = scalar_to_string(v) {
                values.insert(layer.clone(), v);
            }
        }
    }
    Ok(TraitRecord { id, values })
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Fetches per-token trait records from a templated location.
#[derive(Clone, Debug)]
pub struct MetadataResolver {
    source: Arc<dyn AssetSource>,
    template: String,
    timeout: Duration,
}

impl MetadataResolver {
    pub fn new(source: Arc<dyn AssetSource>, template: impl Into<String>, timeout: Duration) -> Self {
        Self {
            source,
            template: template.into(),
            timeout,
        }
    }

    pub fn location_for(&self, id: u32) -> String {
        self.template.replace("{id}", &id.to_string())
    }

    /// Fetch and parse the record for token `id`. A single attempt; no retries.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_record(&self, id: u32) -> Result<TraitRecord, MetadataFetchError> {
        let location = self.location_for(id);
        let json = load_json(self.source.as_ref(), &location, self.timeout)
            .await
            .map_err(|e| MetadataFetchError::from_load(id, e))?;
        let record = record_from_json(id, &json)?;
        tracing::debug!(%location, traits = record.values.len(), "metadata resolved");
        Ok(record)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/metadata/resolver.rs"]
mod tests;
