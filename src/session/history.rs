use std::collections::VecDeque;
use std::sync::Arc;

use crate::composition::format::FormatKey;
use crate::composition::scene::BackgroundMode;
use crate::render::encode::png_data_url;

/// How many renders the history keeps.
pub const HISTORY_CAPACITY: usize = 6;

/// One past render and the state that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub png: Arc<[u8]>,
    pub token: u32,
    pub format: FormatKey,
    pub background: BackgroundMode,
    /// Custom background file drawn at render time; `None` outside custom mode.
    pub custom_file: Option<String>,
    pub overlay: bool,
}

impl HistorySnapshot {
    /// Gallery label, e.g. `Square · #42`.
    pub fn label(&self) -> String {
        let key = self.format.as_str();
        let mut chars = key.chars();
        let cap: String = chars
            .next()
            .map(|c| c.to_ascii_uppercase().to_string() + chars.as_str())
            .unwrap_or_default();
        format!("{cap} · #{}", self.token)
    }

    pub fn data_url(&self) -> String {
        png_data_url(&self.png)
    }
}

/// Bounded render history, newest first.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: VecDeque<HistorySnapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a render, evicting the oldest entry beyond [`HISTORY_CAPACITY`].
    pub fn push(&mut self, snapshot: HistorySnapshot) {
        self.entries.push_front(snapshot);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    /// Entry `index` counted from the newest (0).
    pub fn get(&self, index: usize) -> Option<&HistorySnapshot> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistorySnapshot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/history.rs"]
mod tests;
