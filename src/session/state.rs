use std::collections::BTreeMap;

use rand::Rng;

use crate::composition::format::FormatKey;
use crate::composition::scene::{BackgroundMode, Scene};
use crate::foundation::core::{TOKEN_MAX, TOKEN_MIN, clamp_token};
use crate::metadata::resolver::TraitRecord;
use crate::presets::table::PresetTable;

/// Everything the editor renders from.
///
/// `presets` and `last_record` are loaded at runtime and never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct EditingState {
    pub format: FormatKey,
    /// Active token, always in `[TOKEN_MIN, TOKEN_MAX]`.
    pub token: u32,
    pub background: BackgroundMode,
    /// Custom background picked per format; a missing entry means the format default.
    pub selected_custom: BTreeMap<FormatKey, String>,
    /// Draw the per-body overlay.
    pub overlay: bool,
    pub presets: PresetTable,
    pub last_record: Option<TraitRecord>,
}

impl Default for EditingState {
    fn default() -> Self {
        Self {
            format: FormatKey::Square,
            token: TOKEN_MIN,
            background: BackgroundMode::FromToken,
            selected_custom: BTreeMap::new(),
            overlay: false,
            presets: PresetTable::default(),
            last_record: None,
        }
    }
}

impl EditingState {
    /// Custom background selected for `format`, falling back to the format default.
    pub fn custom_for(&self, format: FormatKey) -> &str {
        self.selected_custom
            .get(&format)
            .map(String::as_str)
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(format.spec().default_background)
    }

    /// Explicit selection for `format`, without the default fallback.
    pub fn explicit_custom_for(&self, format: FormatKey) -> Option<&str> {
        self.selected_custom.get(&format).map(String::as_str)
    }

    pub fn scene(&self) -> Scene {
        Scene {
            format: self.format,
            background: self.background,
            custom_file: Some(self.custom_for(self.format).to_string()),
            overlay: self.overlay,
        }
    }

    /// Switch format. Selecting the active format changes nothing.
    pub fn set_format(&mut self, format: FormatKey) -> bool {
        if self.format == format {
            return false;
        }
        self.format = format;
        true
    }

    pub fn set_token(&mut self, id: i64) -> bool {
        let next = clamp_token(id);
        let changed = next != self.token;
        self.token = next;
        changed
    }

    /// Move the token by `delta`, clamped at the collection bounds.
    pub fn step_token(&mut self, delta: i64) -> bool {
        self.set_token(i64::from(self.token).saturating_add(delta))
    }

    pub fn shuffle_token(&mut self, rng: &mut impl Rng) -> bool {
        self.set_token(i64::from(rng.gen_range(TOKEN_MIN..=TOKEN_MAX)))
    }

    pub fn set_background_mode(&mut self, mode: BackgroundMode) -> bool {
        let changed = self.background != mode;
        self.background = mode;
        changed
    }

    /// Remember `file` as the custom background of the active format.
    pub fn select_custom(&mut self, file: &str) -> bool {
        let changed = self.explicit_custom_for(self.format) != Some(file);
        self.selected_custom.insert(self.format, file.to_string());
        changed
    }

    /// Step through the active format's catalog, wrapping at both ends. Forces custom mode.
    pub fn step_background(&mut self, delta: isize) -> bool {
        let before = (self.background, self.explicit_custom_for(self.format).map(str::to_string));
        self.background = BackgroundMode::Custom;

        let catalog = self.format.spec().backgrounds;
        if !catalog.is_empty() {
            let len = catalog.len() as isize;
            let current = self
                .format
                .spec()
                .background_index(self.custom_for(self.format))
                .unwrap_or(0) as isize;
            let next = (current + delta).rem_euclid(len) as usize;
            self.selected_custom
                .insert(self.format, catalog[next].file.to_string());
        }

        before != (self.background, self.explicit_custom_for(self.format).map(str::to_string))
    }

    /// Pick a random catalog entry other than the current one. Forces custom mode.
    pub fn shuffle_background(&mut self, rng: &mut impl Rng) -> bool {
        let before = (self.background, self.explicit_custom_for(self.format).map(str::to_string));
        self.background = BackgroundMode::Custom;

        let catalog = self.format.spec().backgrounds;
        let current = self.custom_for(self.format).to_string();
        let candidates: Vec<&str> = match catalog {
            [] => Vec::new(),
            [only] => vec![only.file],
            _ => catalog
                .iter()
                .map(|bg| bg.file)
                .filter(|f| *f != current)
                .collect(),
        };
        if !candidates.is_empty() {
            let pick = candidates[rng.gen_range(0..candidates.len())];
            self.selected_custom.insert(self.format, pick.to_string());
        }

        before != (self.background, self.explicit_custom_for(self.format).map(str::to_string))
    }

    pub fn set_overlay(&mut self, on: bool) -> bool {
        let changed = self.overlay != on;
        self.overlay = on;
        changed
    }

    /// Label for the background stepper.
    pub fn background_label(&self) -> &'static str {
        match self.background {
            BackgroundMode::Disabled => "No Background",
            BackgroundMode::Custom | BackgroundMode::FromToken => self
                .format
                .spec()
                .background(self.custom_for(self.format))
                .map(|bg| bg.label)
                .unwrap_or("Background"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/state.rs"]
mod tests;
