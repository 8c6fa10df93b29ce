use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use serde_json::Value;

use crate::composition::format::FormatKey;
use crate::composition::scene::BackgroundMode;
use crate::foundation::core::{clamp_token, parse_token};
use crate::foundation::error::{RascalsError, RascalsResult};
use crate::session::state::EditingState;

/// Storage key of the persisted editor state.
pub const STATE_KEY: &str = "rascals-editor-state-v16";

/// String key/value storage surviving between sessions.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> RascalsResult<()>;
}

/// Store backed by one JSON file holding a key → value object.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> RascalsResult<BTreeMap<String, String>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read store '{}'", self.path.display()))
                    .into());
            }
        };
        serde_json::from_str(&text).map_err(|e| RascalsError::serde(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        match self.read_map() {
            Ok(mut map) => map.remove(key),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "store unreadable");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> RascalsResult<()> {
        let mut map = self.read_map().unwrap_or_default();
        map.insert(key.to_string(), value.to_string());
        let text = serde_json::to_string_pretty(&map).map_err(|e| RascalsError::serde(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store dir '{}'", parent.display()))?;
        }
        std::fs::write(&self.path, text)
            .with_context(|| format!("write store '{}'", self.path.display()))?;
        Ok(())
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn write(&self, key: &str, value: &str) -> RascalsResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState<'a> {
    format: FormatKey,
    tokens: [u32; 1],
    background_mode: BackgroundMode,
    selected_custom: BTreeMap<FormatKey, Option<&'a str>>,
    gm_cups: bool,
}

/// JSON written under [`STATE_KEY`]. Runtime-only fields are left out.
pub fn state_to_json(state: &EditingState) -> String {
    let persisted = PersistedState {
        format: state.format,
        tokens: [state.token],
        background_mode: state.background,
        selected_custom: FormatKey::ALL
            .into_iter()
            .map(|f| (f, state.explicit_custom_for(f)))
            .collect(),
        gm_cups: state.overlay,
    };
    serde_json::to_string(&persisted).unwrap_or_default()
}

/// Apply a persisted document to `state`, field by field. Unknown or malformed fields keep
/// whatever `state` already holds.
pub fn apply_persisted(state: &mut EditingState, json: &Value) {
    let Some(obj) = json.as_object() else {
        return;
    };

    if let Some(format) = obj
        .get("format")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<FormatKey>().ok())
    {
        state.format = format;
    }

    if let Some(first) = obj.get("tokens").and_then(Value::as_array).and_then(|t| t.first()) {
        match first {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    state.token = clamp_token(i);
                } else if let Some(f) = n.as_f64() {
                    state.token = parse_token(&f.to_string());
                }
            }
            Value::String(s) => state.token = parse_token(s),
            _ => {}
        }
    }

    if let Some(mode) = obj
        .get("backgroundMode")
        .cloned()
        .and_then(|v| serde_json::from_value::<BackgroundMode>(v).ok())
    {
        state.background = mode;
    }

    if let Some(selected) = obj.get("selectedCustom").and_then(Value::as_object) {
        for (key, file) in selected {
            let Ok(format) = key.parse::<FormatKey>() else {
                continue;
            };
            match file.as_str().filter(|f| !f.trim().is_empty()) {
                Some(f) => {
                    state.selected_custom.insert(format, f.to_string());
                }
                None => {
                    state.selected_custom.remove(&format);
                }
            }
        }
    }

    if let Some(on) = obj.get("gmCups") {
        state.overlay = on.as_bool().unwrap_or(false);
    }
}

/// Read the persisted state; a missing or unreadable entry yields the built-in defaults.
pub fn load_state(store: &dyn KeyValueStore) -> EditingState {
    let mut state = EditingState::default();
    let Some(text) = store.read(STATE_KEY) else {
        return state;
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => apply_persisted(&mut state, &json),
        Err(e) => tracing::debug!(error = %e, "persisted state is not JSON; using defaults"),
    }
    state
}

/// Persist `state`. Failures are logged and otherwise ignored.
pub fn save_state(store: &dyn KeyValueStore, state: &EditingState) {
    if let Err(e) = store.write(STATE_KEY, &state_to_json(state)) {
        tracing::debug!(error = %e, "persisting editor state failed");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/persist.rs"]
mod tests;
